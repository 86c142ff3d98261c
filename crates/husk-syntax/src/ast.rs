//! Syntax tree for parsed shell programs
//!
//! The tree is a serializable summary of what the grammar recognised. Words
//! are kept exactly as written, quotes and expansions included; evaluating
//! them is the job of [`crate::expand`].

use crate::pos::Pos;
use serde::Serialize;

/// Version of the JSON layout produced for [`File`]
pub const AST_VERSION: u32 = 2;

/// A parsed shell source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub name: String,
    pub stmts: Vec<Stmt>,
    /// Comments, in source order; only filled when the parser keeps them
    pub comments: Vec<Comment>,
}

impl File {
    /// Serialize the file to JSON, wrapped with the layout version
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Versioned<'a> {
            ast_version: u32,
            file: &'a File,
        }
        serde_json::to_string(&Versioned {
            ast_version: AST_VERSION,
            file: self,
        })
    }
}

/// A `#` comment, without the leading `#`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub pos: Pos,
    pub text: String,
}

/// One entry of a command list, such as a line of a script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    /// The statement printed back in canonical form
    pub text: String,
    /// Followed by `&`
    pub background: bool,
    pub cmd: Command,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Command {
    /// `a=b cmd arg...`; both lists may be empty, as in a statement made only
    /// of redirections
    Call {
        assigns: Vec<Assign>,
        args: Vec<String>,
        redirects: Vec<Redirect>,
    },
    /// `[!] a | b ...`
    Pipeline { negated: bool, cmds: Vec<Command> },
    /// `a && b || c ...`
    AndOr { first: Box<Command>, rest: Vec<Chained> },
    /// `{ stmts; }`
    Block {
        stmts: Vec<Stmt>,
        redirects: Vec<Redirect>,
    },
    /// `( stmts )`
    Subshell {
        stmts: Vec<Stmt>,
        redirects: Vec<Redirect>,
    },
    /// `if cond; then stmts; [elif ...] [else ...] fi`
    If {
        branches: Vec<Branch>,
        else_body: Option<Vec<Stmt>>,
        redirects: Vec<Redirect>,
    },
    /// `while cond; do body; done`, or `until` when `until` is set
    While {
        until: bool,
        cond: Vec<Stmt>,
        body: Vec<Stmt>,
        redirects: Vec<Redirect>,
    },
    /// `for name [in items]; do body; done`
    For {
        name: String,
        /// `None` when the `in` list was left out and the positional
        /// parameters are iterated
        items: Option<Vec<String>>,
        body: Vec<Stmt>,
        redirects: Vec<Redirect>,
    },
    /// `for ((init; cond; step)); do body; done`
    ArithFor {
        body: Vec<Stmt>,
        redirects: Vec<Redirect>,
    },
    /// `case word in pattern) stmts;; ... esac`
    Case {
        word: String,
        items: Vec<CaseItem>,
        redirects: Vec<Redirect>,
    },
    /// `(( expr ))`
    Arith {
        expr: String,
        redirects: Vec<Redirect>,
    },
    /// `[[ expr ]]`
    Test { expr: String },
    /// `name() body` or `function name body`
    Func { name: String, body: Box<Command> },
    /// A bats `@test "description" { ... }` block
    BatsTest {
        description: String,
        body: Box<Command>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AndOrOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// The second and later members of an `&&`/`||` list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chained {
    pub op: AndOrOp,
    pub cmd: Command,
}

/// `name=value`, `name+=value` or `name=(a b)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assign {
    pub name: String,
    pub append: bool,
    /// The value words; a scalar assignment has exactly one
    pub values: Vec<String>,
    pub array: bool,
}

/// A condition and the statements it guards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub cond: Vec<Stmt>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseItem {
    pub patterns: Vec<String>,
    pub stmts: Vec<Stmt>,
}

/// A redirection such as `2>&1`, `<<EOF` or `&>log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    /// Explicit file descriptor, as in `2>`
    pub fd: Option<u32>,
    pub op: String,
    /// File name, descriptor or here-document body
    pub target: String,
}
