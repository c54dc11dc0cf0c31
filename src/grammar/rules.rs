//! The base C++ production table.
//!
//! Alternative order is load-bearing: within one static-precedence level the
//! engine tries alternatives in declaration order, so longer or
//! keyword-anchored forms come first and catch-all forms come last. The
//! annotation dialect is layered on top by [`super::unreal`], which inserts
//! its rules as sibling alternatives at the choice points defined here.

use crate::diagnostics::GrammarError;
use crate::grammar::precedence::{prec, DECLARATOR_TAILS, EXPRESSION_TAILS};
use crate::grammar::{
    alias, choice, comma_sep, comma_sep1, field, immediate, lit, optional, pattern, prec_right,
    recover_until, repeat, repeat1, seq, subexpr, sym, Grammar, GrammarBuilder, Rule,
};

/// Token patterns, compiled once at grammar build time.
mod tokens {
    pub const IDENTIFIER: &str = r"[A-Za-z_][A-Za-z0-9_]*";
    pub const NUMBER: &str = r"0[xX][0-9a-fA-F']+[uUlL]*|0[bB][01']+[uUlL]*|(?:[0-9][0-9']*)?\.[0-9][0-9']*(?:[eE][+-]?[0-9]+)?[fFlL]?|[0-9][0-9']*(?:\.[0-9']*)?(?:[eE][+-]?[0-9]+)?[uUlLfF]*";
    pub const STRING: &str = r#"(?:u8|[uUL])?"(?:[^"\\\n]|\\(?:.|\r?\n))*""#;
    pub const CHAR: &str = r"(?:u8|[uUL])?'(?:[^'\\\n]|\\.)+'";
    pub const PRIMITIVE_TYPE: &str = r"(?:bool|char(?:8_t|16_t|32_t)?|wchar_t|double|float|u?int(?:8_t|16_t|32_t|64_t|ptr_t)?|void|size_t|ssize_t)\b";
    pub const PREPROC_DIRECTIVE: &str = r"#[a-zA-Z_][a-zA-Z0-9_]*";
    pub const PREPROC_ARG: &str = r"(?:[^\n\\]|\\\r?\n|\\.)+";
    pub const SYSTEM_LIB_STRING: &str = r"<[^>\n]+>";
}

pub(super) fn identifier() -> Rule {
    pattern("identifier", tokens::IDENTIFIER)
}

fn type_identifier() -> Rule {
    alias(identifier(), "type_identifier")
}

pub(super) fn string_literal() -> Rule {
    pattern("string_literal", tokens::STRING)
}

pub(super) fn number_literal() -> Rule {
    pattern("number_literal", tokens::NUMBER)
}

fn primitive_type() -> Rule {
    pattern("primitive_type", tokens::PRIMITIVE_TYPE)
}

/// Builds and compiles the full C++/Unreal grammar.
pub fn build() -> Result<Grammar, GrammarError> {
    let mut g = GrammarBuilder::new("cpp_unreal", "translation_unit");
    base(&mut g);
    super::unreal::add(&mut g);
    g.conflicts(super::conflicts::CONFLICTS.to_vec());
    g.recover("translation_unit");
    g.recover("compound_statement");
    g.recover("field_declaration_list");
    g.recover("declaration_list");
    g.compile()
}

fn base(g: &mut GrammarBuilder) {
    top_level(g);
    declarations(g);
    types(g);
    declarators(g);
    classes(g);
    templates(g);
    statements(g);
    expressions(g);
    preproc(g);
}

// ============================================================================
// TOP LEVEL
// ============================================================================

fn top_level(g: &mut GrammarBuilder) {
    g.rule("translation_unit", repeat(sym("_top_level_item")));

    g.rule(
        "_top_level_item",
        choice(vec![
            sym("preproc_include"),
            sym("preproc_def"),
            sym("preproc_call"),
            sym("namespace_alias_definition"),
            sym("namespace_definition"),
            sym("alias_declaration"),
            sym("using_declaration"),
            sym("static_assert_declaration"),
            sym("template_declaration"),
            sym("template_instantiation"),
            sym("declaration"),
            sym("function_definition"),
            alias(
                sym("constructor_or_destructor_definition"),
                "function_definition",
            ),
            lit(";"),
        ]),
    );

    g.rule(
        "namespace_definition",
        seq(vec![
            lit("namespace"),
            optional(field("name", sym("namespace_identifier"))),
            field("body", sym("declaration_list")),
        ]),
    );
    g.rule(
        "namespace_identifier",
        seq(vec![
            identifier(),
            repeat(seq(vec![lit("::"), identifier()])),
        ]),
    );
    g.rule(
        "declaration_list",
        seq(vec![lit("{"), repeat(sym("_top_level_item")), lit("}")]),
    );
    g.rule(
        "namespace_alias_definition",
        seq(vec![
            lit("namespace"),
            field("name", identifier()),
            lit("="),
            choice(vec![sym("qualified_identifier"), identifier()]),
            lit(";"),
        ]),
    );

    g.rule(
        "alias_declaration",
        seq(vec![
            lit("using"),
            field("name", type_identifier()),
            lit("="),
            field("type", sym("type_descriptor")),
            lit(";"),
        ]),
    );
    g.rule(
        "using_declaration",
        seq(vec![
            lit("using"),
            optional(choice(vec![lit("namespace"), lit("enum")])),
            choice(vec![sym("qualified_identifier"), identifier()]),
            lit(";"),
        ]),
    );
    g.rule(
        "static_assert_declaration",
        seq(vec![
            lit("static_assert"),
            lit("("),
            field("condition", subexpr(prec::ARG_FLOOR)),
            optional(seq(vec![lit(","), field("message", string_literal())])),
            lit(")"),
            lit(";"),
        ]),
    );
}

// ============================================================================
// DECLARATIONS
// ============================================================================

fn declarations(g: &mut GrammarBuilder) {
    g.rule(
        "declaration",
        seq(vec![
            sym("_declaration_specifiers"),
            comma_sep(field(
                "declarator",
                choice(vec![sym("init_declarator"), sym("_declarator")]),
            )),
            lit(";"),
        ]),
    );

    g.rule(
        "_declaration_specifiers",
        seq(vec![
            repeat(sym("_declaration_modifier")),
            field("type", sym("_type_specifier")),
            repeat(sym("_declaration_modifier")),
        ]),
    );
    g.rule(
        "_declaration_modifier",
        choice(vec![
            sym("storage_class_specifier"),
            sym("type_qualifier"),
            sym("attribute_declaration"),
        ]),
    );
    g.rule(
        "storage_class_specifier",
        choice(vec![
            lit("extern"),
            lit("static"),
            lit("inline"),
            lit("constexpr"),
            lit("thread_local"),
            lit("register"),
            lit("explicit"),
            lit("virtual"),
            lit("friend"),
            lit("typedef"),
        ]),
    );
    g.rule(
        "type_qualifier",
        choice(vec![
            lit("const"),
            lit("volatile"),
            lit("mutable"),
            lit("constinit"),
            lit("consteval"),
        ]),
    );
    g.rule("virtual_specifier", choice(vec![lit("final"), lit("override")]));

    g.rule(
        "init_declarator",
        seq(vec![
            field("declarator", sym("_declarator")),
            choice(vec![
                seq(vec![
                    lit("="),
                    field(
                        "value",
                        choice(vec![
                            sym("initializer_list"),
                            lit("default"),
                            lit("delete"),
                            subexpr(prec::ARG_FLOOR),
                            recover_until(&[",", ";"], "expression"),
                        ]),
                    ),
                ]),
                field("value", sym("initializer_list")),
                field("value", sym("argument_list")),
            ]),
        ]),
    );

    g.rule(
        "initializer_list",
        seq(vec![
            lit("{"),
            optional(seq(vec![
                sym("_initializer_item"),
                repeat(seq(vec![lit(","), sym("_initializer_item")])),
                optional(lit(",")),
            ])),
            lit("}"),
        ]),
    );
    g.rule(
        "_initializer_item",
        choice(vec![sym("initializer_list"), subexpr(prec::ARG_FLOOR)]),
    );

    g.rule(
        "attribute_declaration",
        seq(vec![lit("[["), comma_sep1(sym("attribute")), lit("]]")]),
    );
    g.rule(
        "attribute",
        seq(vec![
            optional(seq(vec![field("prefix", identifier()), lit("::")])),
            field("name", identifier()),
            optional(sym("argument_list")),
        ]),
    );

    g.rule(
        "function_definition",
        seq(vec![
            sym("_declaration_specifiers"),
            field("declarator", sym("_declarator")),
            field("body", sym("compound_statement")),
        ]),
    );

    g.rule(
        "constructor_or_destructor_definition",
        seq(vec![
            repeat(sym("_declaration_modifier")),
            field(
                "name",
                choice(vec![
                    sym("destructor_name"),
                    sym("qualified_identifier"),
                    identifier(),
                ]),
            ),
            field("parameters", sym("parameter_list")),
            optional(sym("field_initializer_list")),
            choice(vec![
                field("body", sym("compound_statement")),
                seq(vec![lit("="), choice(vec![lit("default"), lit("delete")]), lit(";")]),
                lit(";"),
            ]),
        ]),
    );
    g.rule("destructor_name", seq(vec![lit("~"), identifier()]));
    g.rule(
        "field_initializer_list",
        seq(vec![lit(":"), comma_sep1(sym("field_initializer"))]),
    );
    g.rule(
        "field_initializer",
        seq(vec![
            choice(vec![sym("qualified_identifier"), identifier()]),
            choice(vec![sym("argument_list"), sym("initializer_list")]),
        ]),
    );
}

// ============================================================================
// TYPES
// ============================================================================

fn types(g: &mut GrammarBuilder) {
    g.rule(
        "_type_specifier",
        choice(vec![
            sym("class_specifier"),
            sym("struct_specifier"),
            sym("union_specifier"),
            sym("enum_specifier"),
            sym("sized_type_specifier"),
            primitive_type(),
            alias(lit("auto"), "auto"),
            sym("template_type"),
            alias(sym("qualified_type_identifier"), "qualified_identifier"),
            type_identifier(),
        ]),
    );

    g.rule(
        "sized_type_specifier",
        seq(vec![
            repeat1(choice(vec![
                lit("signed"),
                lit("unsigned"),
                lit("long"),
                lit("short"),
            ])),
            optional(primitive_type()),
        ]),
    );

    g.rule(
        "qualified_type_identifier",
        seq(vec![
            field("scope", alias(identifier(), "namespace_identifier")),
            lit("::"),
            field(
                "name",
                choice(vec![
                    alias(sym("qualified_type_identifier"), "qualified_identifier"),
                    sym("template_type"),
                    type_identifier(),
                ]),
            ),
        ]),
    );

    g.rule(
        "type_descriptor",
        seq(vec![
            repeat(sym("type_qualifier")),
            field("type", sym("_type_specifier")),
            repeat(sym("type_qualifier")),
            optional(field("declarator", sym("_abstract_declarator"))),
        ]),
    );

    g.rule(
        "_abstract_declarator",
        choice(vec![
            sym("abstract_pointer_declarator"),
            sym("abstract_reference_declarator"),
            sym("abstract_array_declarator"),
        ]),
    );
    g.rule(
        "abstract_pointer_declarator",
        seq(vec![
            lit("*"),
            repeat(sym("type_qualifier")),
            optional(field("declarator", sym("_abstract_declarator"))),
        ]),
    );
    g.rule(
        "abstract_reference_declarator",
        seq(vec![
            choice(vec![lit("&&"), lit("&")]),
            optional(field("declarator", sym("_abstract_declarator"))),
        ]),
    );
    g.rule(
        "abstract_array_declarator",
        seq(vec![
            lit("["),
            optional(field("size", subexpr(prec::ARG_FLOOR))),
            lit("]"),
        ]),
    );
}

// ============================================================================
// DECLARATORS
// ============================================================================

fn declarators(g: &mut GrammarBuilder) {
    // Function and array suffixes are climbed via DECLARATOR_TAILS, so
    // `*f()` nests as pointer-of-function without left recursion here.
    g.climb(
        "_declarator",
        choice(vec![
            sym("pointer_declarator"),
            sym("reference_declarator"),
            sym("operator_name"),
            sym("qualified_identifier"),
            identifier(),
            sym("parenthesized_declarator"),
        ]),
        DECLARATOR_TAILS,
    );

    g.rule(
        "pointer_declarator",
        seq(vec![
            lit("*"),
            repeat(sym("type_qualifier")),
            field("declarator", sym("_declarator")),
        ]),
    );
    g.rule(
        "reference_declarator",
        seq(vec![
            choice(vec![lit("&&"), lit("&")]),
            field("declarator", sym("_declarator")),
        ]),
    );
    g.rule(
        "parenthesized_declarator",
        seq(vec![lit("("), sym("_declarator"), lit(")")]),
    );

    g.rule(
        "operator_name",
        seq(vec![
            lit("operator"),
            choice(vec![
                lit("()"),
                lit("[]"),
                seq(vec![lit("new"), optional(lit("[]"))]),
                seq(vec![lit("delete"), optional(lit("[]"))]),
                lit("<<="),
                lit(">>="),
                lit("<=>"),
                lit("=="),
                lit("!="),
                lit("<="),
                lit(">="),
                lit("&&"),
                lit("||"),
                lit("<<"),
                lit(">>"),
                lit("+="),
                lit("-="),
                lit("*="),
                lit("/="),
                lit("%="),
                lit("&="),
                lit("|="),
                lit("^="),
                lit("++"),
                lit("--"),
                lit("->"),
                lit("+"),
                lit("-"),
                lit("*"),
                lit("/"),
                lit("%"),
                lit("<"),
                lit(">"),
                lit("="),
                lit("&"),
                lit("|"),
                lit("^"),
                lit("!"),
                lit("~"),
                lit(","),
            ]),
        ]),
    );

    g.rule(
        "parameter_list",
        seq(vec![
            lit("("),
            comma_sep(choice(vec![sym("parameter_declaration"), lit("...")])),
            lit(")"),
        ]),
    );
    g.rule(
        "parameter_declaration",
        seq(vec![
            sym("_declaration_specifiers"),
            optional(field(
                "declarator",
                choice(vec![sym("_declarator"), sym("_abstract_declarator")]),
            )),
            optional(seq(vec![
                lit("="),
                field("default_value", subexpr(prec::ARG_FLOOR)),
            ])),
        ]),
    );

    // Trailing qualifiers a function declarator may climb after its
    // parameter list: `const`, ref-qualifiers, `noexcept`, `override`/`final`.
    g.rule(
        "_method_qualifier",
        choice(vec![
            sym("type_qualifier"),
            sym("virtual_specifier"),
            sym("noexcept"),
            lit("&&"),
            lit("&"),
        ]),
    );
    g.rule(
        "noexcept",
        seq(vec![
            lit("noexcept"),
            optional(seq(vec![lit("("), subexpr(prec::ARG_FLOOR), lit(")")])),
        ]),
    );
}

// ============================================================================
// CLASSES & ENUMS
// ============================================================================

fn classes(g: &mut GrammarBuilder) {
    g.rule("class_specifier", seq(vec![lit("class"), sym("_class_declaration")]));
    g.rule("struct_specifier", seq(vec![lit("struct"), sym("_class_declaration")]));
    g.rule("union_specifier", seq(vec![lit("union"), sym("_class_declaration")]));

    g.rule(
        "_class_declaration",
        choice(vec![
            seq(vec![
                field("name", sym("_class_name")),
                optional(sym("virtual_specifier")),
                optional(sym("base_class_clause")),
                field("body", sym("field_declaration_list")),
            ]),
            field("body", sym("field_declaration_list")),
            field("name", sym("_class_name")),
        ]),
    );

    g.rule(
        "_class_name",
        prec_right(
            0,
            choice(vec![
                sym("template_type"),
                alias(sym("qualified_type_identifier"), "qualified_identifier"),
                type_identifier(),
            ]),
        ),
    );

    g.rule(
        "base_class_clause",
        seq(vec![
            lit(":"),
            comma_sep1(seq(vec![
                optional(choice(vec![
                    seq(vec![sym("_access_keyword"), optional(lit("virtual"))]),
                    seq(vec![lit("virtual"), optional(sym("_access_keyword"))]),
                ])),
                sym("_class_name"),
                optional(lit("...")),
            ])),
        ]),
    );
    g.rule(
        "_access_keyword",
        choice(vec![lit("public"), lit("private"), lit("protected")]),
    );

    g.rule(
        "field_declaration_list",
        seq(vec![lit("{"), repeat(sym("_field_item")), lit("}")]),
    );

    g.rule(
        "_field_item",
        choice(vec![
            sym("preproc_include"),
            sym("preproc_def"),
            sym("preproc_call"),
            sym("access_specifier"),
            sym("alias_declaration"),
            sym("using_declaration"),
            sym("static_assert_declaration"),
            sym("template_declaration"),
            alias(
                sym("constructor_or_destructor_definition"),
                "function_definition",
            ),
            sym("function_definition"),
            sym("field_declaration"),
            lit(";"),
        ]),
    );

    g.rule(
        "access_specifier",
        seq(vec![sym("_access_keyword"), lit(":")]),
    );

    g.rule(
        "field_declaration",
        seq(vec![
            sym("_declaration_specifiers"),
            comma_sep(field(
                "declarator",
                choice(vec![sym("init_declarator"), sym("_declarator")]),
            )),
            lit(";"),
        ]),
    );

    g.rule(
        "enum_specifier",
        seq(vec![
            lit("enum"),
            optional(choice(vec![lit("class"), lit("struct")])),
            choice(vec![
                seq(vec![
                    field("name", sym("_class_name")),
                    optional(sym("_enum_base_clause")),
                    optional(field("body", sym("enumerator_list"))),
                ]),
                field("body", sym("enumerator_list")),
            ]),
        ]),
    );
    g.rule(
        "_enum_base_clause",
        seq(vec![
            lit(":"),
            field(
                "base",
                choice(vec![
                    alias(sym("qualified_type_identifier"), "qualified_identifier"),
                    sym("sized_type_specifier"),
                    primitive_type(),
                    type_identifier(),
                ]),
            ),
        ]),
    );
    g.rule(
        "enumerator_list",
        seq(vec![
            lit("{"),
            optional(seq(vec![
                sym("enumerator"),
                repeat(seq(vec![lit(","), sym("enumerator")])),
                optional(lit(",")),
            ])),
            lit("}"),
        ]),
    );
    g.rule(
        "enumerator",
        seq(vec![
            field("name", identifier()),
            optional(seq(vec![lit("="), field("value", subexpr(prec::ARG_FLOOR))])),
        ]),
    );
}

// ============================================================================
// TEMPLATES
// ============================================================================

fn templates(g: &mut GrammarBuilder) {
    g.rule(
        "template_declaration",
        seq(vec![
            lit("template"),
            field("parameters", sym("template_parameter_list")),
            choice(vec![
                sym("template_declaration"),
                sym("alias_declaration"),
                sym("declaration"),
                sym("function_definition"),
                alias(
                    sym("constructor_or_destructor_definition"),
                    "function_definition",
                ),
            ]),
        ]),
    );
    g.rule(
        "template_instantiation",
        seq(vec![lit("template"), sym("declaration")]),
    );
    g.rule(
        "template_parameter_list",
        seq(vec![
            lit("<"),
            comma_sep(choice(vec![
                sym("type_parameter_declaration"),
                sym("parameter_declaration"),
            ])),
            lit(">"),
        ]),
    );
    g.rule(
        "type_parameter_declaration",
        seq(vec![
            choice(vec![lit("typename"), lit("class")]),
            optional(lit("...")),
            optional(field("name", type_identifier())),
            optional(seq(vec![lit("="), field("default", sym("type_descriptor"))])),
        ]),
    );

    g.rule(
        "template_type",
        seq(vec![
            field("name", type_identifier()),
            field("arguments", sym("template_argument_list")),
        ]),
    );
    g.rule(
        "template_argument_list",
        seq(vec![
            lit("<"),
            comma_sep(choice(vec![
                sym("type_descriptor"),
                subexpr(prec::TEMPLATE_ARG_FLOOR),
            ])),
            lit(">"),
        ]),
    );
}

// ============================================================================
// STATEMENTS
// ============================================================================

fn statements(g: &mut GrammarBuilder) {
    g.rule(
        "compound_statement",
        seq(vec![lit("{"), repeat(sym("_block_item")), lit("}")]),
    );

    g.rule(
        "_block_item",
        choice(vec![
            sym("preproc_include"),
            sym("preproc_def"),
            sym("preproc_call"),
            sym("alias_declaration"),
            sym("using_declaration"),
            sym("static_assert_declaration"),
            sym("declaration"),
            sym("_statement"),
        ]),
    );

    g.rule(
        "_statement",
        choice(vec![sym("case_statement"), sym("_non_case_statement")]),
    );
    g.rule(
        "_non_case_statement",
        choice(vec![
            sym("compound_statement"),
            sym("if_statement"),
            sym("while_statement"),
            sym("do_statement"),
            sym("for_range_loop"),
            sym("for_statement"),
            sym("switch_statement"),
            sym("break_statement"),
            sym("continue_statement"),
            sym("return_statement"),
            sym("expression_statement"),
        ]),
    );

    g.rule(
        "expression_statement",
        seq(vec![optional(sym("_expression")), lit(";")]),
    );

    g.rule(
        "if_statement",
        seq(vec![
            lit("if"),
            optional(lit("constexpr")),
            field("condition", sym("condition_clause")),
            field("consequence", sym("_statement")),
            optional(seq(vec![lit("else"), field("alternative", sym("_statement"))])),
        ]),
    );
    g.rule(
        "condition_clause",
        seq(vec![lit("("), field("value", sym("_expression")), lit(")")]),
    );

    g.rule(
        "while_statement",
        seq(vec![
            lit("while"),
            field("condition", sym("condition_clause")),
            field("body", sym("_statement")),
        ]),
    );
    g.rule(
        "do_statement",
        seq(vec![
            lit("do"),
            field("body", sym("_statement")),
            lit("while"),
            field("condition", sym("condition_clause")),
            lit(";"),
        ]),
    );

    g.rule(
        "for_statement",
        seq(vec![
            lit("for"),
            lit("("),
            field(
                "initializer",
                choice(vec![
                    sym("declaration"),
                    seq(vec![optional(sym("_expression")), lit(";")]),
                ]),
            ),
            optional(field("condition", sym("_expression"))),
            lit(";"),
            optional(field("update", sym("_expression"))),
            lit(")"),
            field("body", sym("_statement")),
        ]),
    );
    g.rule(
        "for_range_loop",
        seq(vec![
            lit("for"),
            lit("("),
            sym("_declaration_specifiers"),
            field("declarator", sym("_declarator")),
            lit(":"),
            field(
                "right",
                choice(vec![sym("initializer_list"), subexpr(prec::ARG_FLOOR)]),
            ),
            lit(")"),
            field("body", sym("_statement")),
        ]),
    );

    g.rule(
        "switch_statement",
        seq(vec![
            lit("switch"),
            field("condition", sym("condition_clause")),
            field("body", sym("compound_statement")),
        ]),
    );
    g.rule(
        "case_statement",
        seq(vec![
            choice(vec![
                seq(vec![lit("case"), field("value", subexpr(prec::ARG_FLOOR))]),
                lit("default"),
            ]),
            lit(":"),
            repeat(choice(vec![sym("declaration"), sym("_non_case_statement")])),
        ]),
    );

    g.rule("break_statement", seq(vec![lit("break"), lit(";")]));
    g.rule("continue_statement", seq(vec![lit("continue"), lit(";")]));
    g.rule(
        "return_statement",
        seq(vec![
            lit("return"),
            optional(choice(vec![sym("_expression"), sym("initializer_list")])),
            lit(";"),
        ]),
    );
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

fn expressions(g: &mut GrammarBuilder) {
    // Prefix forms only; every infix and postfix continuation lives in
    // EXPRESSION_TAILS and is climbed against the caller's minimum binding
    // power.
    g.climb(
        "_expression",
        choice(vec![
            sym("named_cast_expression"),
            sym("sizeof_expression"),
            sym("new_expression"),
            sym("delete_expression"),
            sym("raw_string_literal"),
            sym("update_expression"),
            sym("unary_expression"),
            sym("pointer_expression"),
            alias(lit("true"), "true"),
            alias(lit("false"), "false"),
            alias(lit("nullptr"), "null"),
            alias(lit("this"), "this"),
            number_literal(),
            string_literal(),
            pattern("char_literal", tokens::CHAR),
            sym("template_function"),
            sym("qualified_identifier"),
            identifier(),
            sym("parenthesized_expression"),
            sym("cast_expression"),
        ]),
        EXPRESSION_TAILS,
    );

    g.rule(
        "unary_expression",
        seq(vec![
            field("operator", choice(vec![lit("!"), lit("~"), lit("-"), lit("+")])),
            field("argument", subexpr(prec::UNARY)),
        ]),
    );
    g.rule(
        "pointer_expression",
        seq(vec![
            field("operator", choice(vec![lit("*"), lit("&")])),
            field("argument", subexpr(prec::CAST)),
        ]),
    );
    g.rule(
        "update_expression",
        seq(vec![
            field("operator", choice(vec![lit("++"), lit("--")])),
            field("argument", subexpr(prec::UNARY)),
        ]),
    );

    g.rule(
        "parenthesized_expression",
        seq(vec![lit("("), sym("_expression"), lit(")")]),
    );
    g.rule(
        "cast_expression",
        seq(vec![
            lit("("),
            field("type", sym("type_descriptor")),
            lit(")"),
            field("value", subexpr(prec::CAST)),
        ]),
    );
    g.rule(
        "named_cast_expression",
        seq(vec![
            choice(vec![
                lit("static_cast"),
                lit("dynamic_cast"),
                lit("const_cast"),
                lit("reinterpret_cast"),
            ]),
            lit("<"),
            field("type", sym("type_descriptor")),
            lit(">"),
            lit("("),
            field("value", sym("_expression")),
            lit(")"),
        ]),
    );
    g.rule(
        "sizeof_expression",
        seq(vec![
            lit("sizeof"),
            choice(vec![
                seq(vec![lit("("), field("type", sym("type_descriptor")), lit(")")]),
                field("value", subexpr(prec::UNARY)),
            ]),
        ]),
    );

    g.rule(
        "new_expression",
        seq(vec![
            lit("new"),
            field("type", sym("_type_specifier")),
            optional(field("declarator", sym("new_declarator"))),
            optional(field(
                "arguments",
                choice(vec![sym("argument_list"), sym("initializer_list")]),
            )),
        ]),
    );
    g.rule(
        "new_declarator",
        seq(vec![
            lit("["),
            field("length", subexpr(prec::ARG_FLOOR)),
            lit("]"),
            optional(sym("new_declarator")),
        ]),
    );
    g.rule(
        "delete_expression",
        seq(vec![
            lit("delete"),
            optional(seq(vec![lit("["), lit("]")])),
            field("value", subexpr(prec::UNARY)),
        ]),
    );

    g.rule(
        "qualified_identifier",
        seq(vec![
            field("scope", alias(identifier(), "namespace_identifier")),
            lit("::"),
            field(
                "name",
                choice(vec![
                    sym("qualified_identifier"),
                    sym("template_function"),
                    identifier(),
                ]),
            ),
        ]),
    );

    // Dynamic precedence favors the template reading; when the rest of the
    // statement cannot be completed the resolver replays the comparison
    // reading instead.
    g.rule(
        "template_function",
        crate::grammar::prec_dyn(
            1,
            seq(vec![
                field("name", identifier()),
                field("arguments", sym("template_argument_list")),
            ]),
        ),
    );

    g.rule(
        "argument_list",
        seq(vec![
            lit("("),
            comma_sep(choice(vec![
                sym("initializer_list"),
                subexpr(prec::ARG_FLOOR),
            ])),
            lit(")"),
        ]),
    );

    g.rule(
        "raw_string_literal",
        seq(vec![
            choice(vec![
                lit("R\""),
                lit("LR\""),
                lit("uR\""),
                lit("UR\""),
                lit("u8R\""),
            ]),
            Rule::External(crate::grammar::ExternalKind::RawStringTail),
        ]),
    );

    g.rule(
        "_field_name",
        choice(vec![
            alias(sym("template_function"), "template_method"),
            alias(identifier(), "field_identifier"),
        ]),
    );
}

// ============================================================================
// PREPROCESSOR
// ============================================================================

fn preproc(g: &mut GrammarBuilder) {
    g.rule(
        "preproc_include",
        seq(vec![
            lit("#include"),
            field(
                "path",
                choice(vec![
                    string_literal(),
                    pattern("system_lib_string", tokens::SYSTEM_LIB_STRING),
                ]),
            ),
        ]),
    );
    g.rule(
        "preproc_def",
        seq(vec![
            lit("#define"),
            field("name", identifier()),
            optional(field(
                "value",
                immediate(pattern("preproc_arg", tokens::PREPROC_ARG)),
            )),
        ]),
    );
    g.rule(
        "preproc_call",
        seq(vec![
            field(
                "directive",
                pattern("preproc_directive", tokens::PREPROC_DIRECTIVE),
            ),
            optional(field(
                "argument",
                immediate(pattern("preproc_arg", tokens::PREPROC_ARG)),
            )),
        ]),
    );
}
