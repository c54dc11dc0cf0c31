//! Precedence and associativity tables.
//!
//! `PREC` is the numeric ladder shared by the whole grammar: operator entries
//! drive the expression climb, and the named non-operator slots (declaration
//! vs. expression, macro declarations over generic ones) are referenced from
//! the rule table. Tail tables list every infix/postfix continuation of a
//! climbing rule; the engine consumes a tail only when its level clears the
//! current minimum binding power, so a single table also expresses the
//! restricted sub-grammars (argument positions exclude `,`, template argument
//! positions exclude `<`/`>`/shifts).

use crate::grammar::Assoc;

/// Numeric precedence levels. Higher binds tighter.
pub mod prec {
    pub const COMMA: i32 = -3;
    pub const ASSIGN: i32 = -2;
    pub const CONDITIONAL: i32 = -1;
    pub const DEFAULT: i32 = 0;
    pub const LOGICAL_OR: i32 = 1;
    pub const LOGICAL_AND: i32 = 2;
    pub const INCLUSIVE_OR: i32 = 3;
    pub const EXCLUSIVE_OR: i32 = 4;
    pub const BITWISE_AND: i32 = 5;
    pub const EQUAL: i32 = 6;
    pub const RELATIONAL: i32 = 7;
    pub const THREE_WAY: i32 = RELATIONAL + 1;
    pub const SHIFT: i32 = 9;
    pub const ADD: i32 = 10;
    pub const MULTIPLY: i32 = 11;
    pub const CAST: i32 = 12;
    pub const UNARY: i32 = 13;
    pub const NEW: i32 = 14;
    pub const CALL: i32 = 15;
    pub const FIELD: i32 = 16;
    pub const POSTFIX: i32 = 17;
    pub const SUBSCRIPT: i32 = 18;

    /// Floor for expressions in argument and initializer positions: `,` is a
    /// separator there, not an operator.
    pub const ARG_FLOOR: i32 = ASSIGN;
    /// Floor for expression-valued template arguments: relational and shift
    /// operators would swallow the closing `>` (or `>>`).
    pub const TEMPLATE_ARG_FLOOR: i32 = SHIFT + 1;

    /// Static precedence of the annotation-macro declaration forms over the
    /// plain declarations they could also match.
    pub const UNREAL_DECLARATION: i32 = 2;
}

/// One infix or postfix continuation of a climbing rule.
#[derive(Debug, Clone, Copy)]
pub struct TailEntry {
    pub shape: TailShape,
    pub level: i32,
    pub assoc: Assoc,
    /// Node kind of the wrapper built around the left-hand side.
    pub kind: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailShape {
    /// `lhs op rhs` with rhs climbed at this entry's level.
    Binary { op: &'static str },
    /// `lhs op rhs` where rhs may also be an initializer list.
    Assign { op: &'static str },
    /// `lhs ? consequence : alternative`.
    Ternary,
    /// Postfix `++`/`--`.
    Update { op: &'static str },
    /// `lhs ( arguments )`.
    Call,
    /// `lhs [ index ]`.
    Subscript,
    /// `lhs . name` / `lhs -> name`.
    Member { op: &'static str },
    /// `lhs , rhs`.
    Comma,
    /// Declarator suffix: parameter list plus trailing method qualifiers.
    Params,
    /// Declarator suffix: `[ size? ]`.
    ArraySuffix,
}

impl TailShape {
    /// Terminal that opens this continuation.
    pub fn trigger(&self) -> &'static str {
        match self {
            TailShape::Binary { op }
            | TailShape::Assign { op }
            | TailShape::Update { op }
            | TailShape::Member { op } => op,
            TailShape::Ternary => "?",
            TailShape::Call | TailShape::Params => "(",
            TailShape::Subscript | TailShape::ArraySuffix => "[",
            TailShape::Comma => ",",
        }
    }
}

const fn binary(op: &'static str, level: i32) -> TailEntry {
    TailEntry {
        shape: TailShape::Binary { op },
        level,
        assoc: Assoc::Left,
        kind: "binary_expression",
    }
}

const fn assign(op: &'static str) -> TailEntry {
    TailEntry {
        shape: TailShape::Assign { op },
        level: prec::ASSIGN,
        assoc: Assoc::Right,
        kind: "assignment_expression",
    }
}

/// Every continuation of `expression`, in no particular order: the engine
/// picks the longest trigger that matches and clears the minimum binding
/// power.
pub static EXPRESSION_TAILS: &[TailEntry] = &[
    // Postfix.
    TailEntry {
        shape: TailShape::Call,
        level: prec::CALL,
        assoc: Assoc::Left,
        kind: "call_expression",
    },
    TailEntry {
        shape: TailShape::Subscript,
        level: prec::SUBSCRIPT,
        assoc: Assoc::Left,
        kind: "subscript_expression",
    },
    TailEntry {
        shape: TailShape::Member { op: "." },
        level: prec::FIELD,
        assoc: Assoc::Left,
        kind: "field_expression",
    },
    TailEntry {
        shape: TailShape::Member { op: "->" },
        level: prec::FIELD,
        assoc: Assoc::Left,
        kind: "field_expression",
    },
    TailEntry {
        shape: TailShape::Update { op: "++" },
        level: prec::POSTFIX,
        assoc: Assoc::Left,
        kind: "update_expression",
    },
    TailEntry {
        shape: TailShape::Update { op: "--" },
        level: prec::POSTFIX,
        assoc: Assoc::Left,
        kind: "update_expression",
    },
    // Binary operators.
    binary("||", prec::LOGICAL_OR),
    binary("&&", prec::LOGICAL_AND),
    binary("|", prec::INCLUSIVE_OR),
    binary("^", prec::EXCLUSIVE_OR),
    binary("&", prec::BITWISE_AND),
    binary("==", prec::EQUAL),
    binary("!=", prec::EQUAL),
    binary("<", prec::RELATIONAL),
    binary(">", prec::RELATIONAL),
    binary("<=", prec::RELATIONAL),
    binary(">=", prec::RELATIONAL),
    binary("<=>", prec::THREE_WAY),
    binary("<<", prec::SHIFT),
    binary(">>", prec::SHIFT),
    binary("+", prec::ADD),
    binary("-", prec::ADD),
    binary("*", prec::MULTIPLY),
    binary("/", prec::MULTIPLY),
    binary("%", prec::MULTIPLY),
    // Assignment.
    assign("="),
    assign("+="),
    assign("-="),
    assign("*="),
    assign("/="),
    assign("%="),
    assign("<<="),
    assign(">>="),
    assign("&="),
    assign("^="),
    assign("|="),
    // Conditional and comma.
    TailEntry {
        shape: TailShape::Ternary,
        level: prec::CONDITIONAL,
        assoc: Assoc::Right,
        kind: "conditional_expression",
    },
    TailEntry {
        shape: TailShape::Comma,
        level: prec::COMMA,
        assoc: Assoc::Left,
        kind: "comma_expression",
    },
];

/// Declarator suffixes: `f(...)` and `a[...]` bind tighter than the pointer
/// and reference prefixes, which the rule table expresses by recursing
/// through the declarator symbol.
pub static DECLARATOR_TAILS: &[TailEntry] = &[
    TailEntry {
        shape: TailShape::Params,
        level: prec::CALL,
        assoc: Assoc::Left,
        kind: "function_declarator",
    },
    TailEntry {
        shape: TailShape::ArraySuffix,
        level: prec::SUBSCRIPT,
        assoc: Assoc::Left,
        kind: "array_declarator",
    },
];
