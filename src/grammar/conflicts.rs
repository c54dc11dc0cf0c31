//! Declared conflict sets.
//!
//! Each set names rules that are acknowledged to be ambiguous at some choice
//! point. Declaring a set instructs the engine to keep the listed
//! alternatives as candidates and let dynamic precedence and declaration
//! order decide, instead of committing to the first match. A set that
//! matches no choice point is a construction-time defect, which keeps this
//! list honest as the grammar evolves.

/// Conflict sets for the base grammar and the annotation dialect, in the
/// order they were identified. Names refer to rules as they appear at the
/// governed choice point (hidden rules included).
pub static CONFLICTS: &[&[&str]] = &[
    // `A b{};` and `x * y;` read as declarations, never statements.
    &["declaration", "_statement"],
    // `a<b>` as template instantiation vs. `a` followed by comparisons.
    &["template_function", "identifier"],
    // `(T)x` vs. `(x)`: parenthesized wins, cast is the fallback.
    &["parenthesized_expression", "cast_expression"],
    // Template arguments: `f<T>` vs. `f<CONSTANT>` in the same slot.
    &["type_descriptor", "_expression"],
    // `for (x : r)` vs. `for (init; cond; step)`.
    &["for_range_loop", "for_statement"],
    // `using a = b;` vs. `using a;`.
    &["alias_declaration", "using_declaration"],
    // Constructors look like declarations until the parameter list.
    &[
        "constructor_or_destructor_definition",
        "function_definition",
        "declaration",
    ],

    // unreal
    &[
        "unreal_class_declaration",
        "unreal_struct_declaration",
        "unreal_enum_declaration",
        "declaration",
    ],
    &["unreal_function_declaration", "field_declaration"],
];
