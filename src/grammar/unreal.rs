//! The Unreal Engine annotation dialect.
//!
//! Every macro construct is layered as an additional alternative at the
//! choice point where its plain counterpart already lives, so the same
//! disambiguation machinery covers both spellings. The macro declaration
//! forms carry elevated static precedence: whenever the macro keyword is
//! present, the macro shape wins over the generic declaration it could also
//! match. Meta groups alias to ordinary expression kinds so downstream
//! consumers see one canonical shape.

use crate::grammar::precedence::prec;
use crate::grammar::rules::{identifier, number_literal, string_literal};
use crate::grammar::{
    alias, choice, comma_sep1, field, lit, optional, pattern, prec as static_prec, seq, sym,
    GrammarBuilder, Rule,
};

const API_SPECIFIER: &str = r"[A-Z][A-Z0-9_]*_API\b";

fn api_specifier() -> Rule {
    pattern("unreal_api_specifier", API_SPECIFIER)
}

/// Registers the dialect rules and splices them into the base grammar's
/// choice points.
pub fn add(g: &mut GrammarBuilder) {
    specifier_lists(g);
    macros(g);
    declarations(g);
    splice(g);
}

// ============================================================================
// SPECIFIER LISTS
// ============================================================================

fn specifier_lists(g: &mut GrammarBuilder) {
    g.rule(
        "unreal_specifier_keyword",
        choice(
            [
                // UCLASS / USTRUCT / UENUM
                "Blueprintable",
                "BlueprintType",
                "Abstract",
                "abstract",
                "MinimalAPI",
                "Deprecated",
                // UPROPERTY
                "EditAnywhere",
                "EditDefaultsOnly",
                "EditInstanceOnly",
                "VisibleAnywhere",
                "VisibleDefaultsOnly",
                "VisibleInstanceOnly",
                "BlueprintReadOnly",
                "BlueprintReadWrite",
                "Config",
                "GlobalConfig",
                "Transient",
                "Replicated",
                "ReplicatedUsing",
                "SaveGame",
                // UFUNCTION
                "BlueprintCallable",
                "BlueprintPure",
                "BlueprintImplementableEvent",
                "BlueprintNativeEvent",
                "Exec",
                "Server",
                "Client",
                "NetMulticast",
                "Reliable",
                "Unreliable",
                "WithValidation",
                // shared
                "Category",
                "meta",
                "DisplayName",
                "ToolTip",
            ]
            .into_iter()
            .map(lit)
            .collect(),
        ),
    );

    // key=value comes first so a bare keyword never shadows an assignment.
    g.rule(
        "unreal_specifier",
        choice(vec![
            seq(vec![
                field(
                    "key",
                    choice(vec![sym("unreal_specifier_keyword"), identifier()]),
                ),
                lit("="),
                field(
                    "value",
                    choice(vec![
                        string_literal(),
                        alias(
                            sym("unreal_meta_assignment_group"),
                            "parenthesized_expression",
                        ),
                        identifier(),
                        number_literal(),
                        alias(lit("true"), "true"),
                        alias(lit("false"), "false"),
                    ]),
                ),
            ]),
            sym("unreal_specifier_keyword"),
            identifier(),
        ]),
    );

    g.rule(
        "unreal_meta_assignment_group",
        seq(vec![
            lit("("),
            comma_sep1(alias(sym("unreal_meta_assignment"), "assignment_expression")),
            lit(")"),
        ]),
    );

    // Value-less keys are legal (e.g. `meta=(Bitflags)`).
    g.rule(
        "unreal_meta_assignment",
        choice(vec![
            seq(vec![
                field("left", alias(identifier(), "unreal_meta_key")),
                lit("="),
                field(
                    "right",
                    choice(vec![
                        string_literal(),
                        identifier(),
                        number_literal(),
                        alias(lit("true"), "true"),
                        alias(lit("false"), "false"),
                    ]),
                ),
            ]),
            field("left", alias(identifier(), "unreal_meta_key")),
        ]),
    );

    g.rule("unreal_specifier_list", comma_sep1(sym("unreal_specifier")));
}

// ============================================================================
// MACRO MARKERS
// ============================================================================

fn macro_call(g: &mut GrammarBuilder, rule: &'static str, keyword: &'static str) {
    g.rule(
        rule,
        seq(vec![
            lit(keyword),
            lit("("),
            field("specifiers", optional(sym("unreal_specifier_list"))),
            lit(")"),
        ]),
    );
}

fn macros(g: &mut GrammarBuilder) {
    macro_call(g, "uclass_macro", "UCLASS");
    macro_call(g, "ustruct_macro", "USTRUCT");
    macro_call(g, "uenum_macro", "UENUM");
    macro_call(g, "uproperty_macro", "UPROPERTY");
    macro_call(g, "ufunction_macro", "UFUNCTION");
    macro_call(g, "umeta_macro", "UMETA");

    g.rule(
        "unreal_body_macro",
        seq(vec![lit("GENERATED_BODY"), lit("("), lit(")")]),
    );
    g.rule(
        "unreal_declare_class_macro",
        seq(vec![
            lit("DECLARE_CLASS"),
            lit("("),
            comma_sep1(crate::grammar::subexpr(prec::ARG_FLOOR)),
            lit(")"),
        ]),
    );
    g.rule(
        "unreal_define_default_object_initializer_macro",
        seq(vec![
            lit("DEFINE_DEFAULT_OBJECT_INITIALIZER_CONSTRUCTOR_CALL"),
            lit("("),
            identifier(),
            lit(")"),
        ]),
    );
    g.rule(
        "unreal_deprecated_macro",
        seq(vec![
            lit("UE_DEPRECATED"),
            lit("("),
            crate::grammar::subexpr(prec::ARG_FLOOR),
            lit(","),
            string_literal(),
            lit(")"),
        ]),
    );

    // DECLARE_FUNCTION(...); ENUM_CLASS_FLAGS(...); and friends. The macro
    // name aliases to `identifier` so consumers see an ordinary call shape.
    g.rule(
        "unreal_declaration_macro",
        seq(vec![
            field(
                "name",
                alias(
                    choice(vec![
                        lit("DECLARE_FUNCTION"),
                        lit("DECLARE_LOG_CATEGORY_EXTERN"),
                        lit("ENUM_CLASS_FLAGS"),
                    ]),
                    "identifier",
                ),
            ),
            field("arguments", sym("argument_list")),
            lit(";"),
        ]),
    );
}

// ============================================================================
// ANNOTATED DECLARATIONS
// ============================================================================

fn declarations(g: &mut GrammarBuilder) {
    g.rule(
        "unreal_class_declaration",
        static_prec(
            prec::UNREAL_DECLARATION,
            seq(vec![
                sym("uclass_macro"),
                lit("class"),
                optional(api_specifier()),
                field("name", sym("_class_name")),
                optional(sym("base_class_clause")),
                field("body", sym("field_declaration_list")),
                lit(";"),
            ]),
        ),
    );

    g.rule(
        "unreal_struct_declaration",
        static_prec(
            prec::UNREAL_DECLARATION,
            seq(vec![
                sym("ustruct_macro"),
                lit("struct"),
                optional(api_specifier()),
                field("name", sym("_class_name")),
                optional(sym("base_class_clause")),
                field("body", sym("field_declaration_list")),
                lit(";"),
            ]),
        ),
    );

    g.rule(
        "unreal_enum_declaration",
        static_prec(
            prec::UNREAL_DECLARATION,
            seq(vec![
                sym("uenum_macro"),
                lit("enum"),
                optional(choice(vec![lit("class"), lit("struct")])),
                field("name", sym("_class_name")),
                optional(sym("_enum_base_clause")),
                field("body", sym("enumerator_list")),
                lit(";"),
            ]),
        ),
    );

    g.rule(
        "unreal_function_declaration",
        static_prec(
            prec::UNREAL_DECLARATION,
            seq(vec![
                optional(sym("unreal_deprecated_macro")),
                sym("ufunction_macro"),
                choice(vec![sym("function_definition"), sym("field_declaration")]),
            ]),
        ),
    );
}

// ============================================================================
// SPLICING INTO THE BASE GRAMMAR
// ============================================================================

fn with_alternatives(old: Rule, front: Vec<Rule>, back: Vec<Rule>) -> Rule {
    let mut items = front;
    match old {
        Rule::Choice(existing) => items.extend(existing),
        other => items.push(other),
    }
    items.extend(back);
    choice(items)
}

fn splice(g: &mut GrammarBuilder) {
    g.extend_rule("_top_level_item", |old| {
        with_alternatives(
            old,
            vec![
                sym("unreal_class_declaration"),
                sym("unreal_struct_declaration"),
                sym("unreal_enum_declaration"),
            ],
            vec![sym("unreal_declaration_macro")],
        )
    });

    g.extend_rule("_field_item", |old| {
        with_alternatives(
            old,
            vec![
                seq(vec![sym("unreal_body_macro"), optional(lit(";"))]),
                seq(vec![sym("unreal_declare_class_macro"), optional(lit(";"))]),
                seq(vec![
                    sym("unreal_define_default_object_initializer_macro"),
                    optional(lit(";")),
                ]),
                sym("unreal_class_declaration"),
                sym("unreal_struct_declaration"),
                sym("unreal_enum_declaration"),
                sym("unreal_function_declaration"),
            ],
            vec![sym("unreal_declaration_macro")],
        )
    });

    // `FOO_API` and `FORCEINLINE` behave as storage class specifiers.
    g.extend_rule("storage_class_specifier", |old| {
        with_alternatives(
            old,
            vec![],
            vec![
                api_specifier(),
                alias(lit("FORCEINLINE"), "unreal_force_inline"),
            ],
        )
    });

    // `class ENGINE_API FThing` in plain (unannotated) declarations.
    g.extend_rule("_class_declaration", |old| {
        seq(vec![optional(api_specifier()), old])
    });

    g.extend_rule("declaration", |old| {
        seq(vec![optional(sym("unreal_deprecated_macro")), old])
    });

    g.extend_rule("field_declaration", |old| {
        seq(vec![
            optional(sym("unreal_deprecated_macro")),
            optional(sym("uproperty_macro")),
            old,
        ])
    });

    g.extend_rule("enumerator", |old| {
        seq(vec![old, optional(sym("umeta_macro"))])
    });
}
