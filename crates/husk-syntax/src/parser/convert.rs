//! Conversion from the grammar's syntax tree to [`crate::ast`]

use crate::ast::{AndOrOp, Assign, Branch, CaseItem, Chained, Command, Redirect, Stmt};
use crate::source::BATS_TEST_PREFIX;
use brush_parser::ast;

pub(super) struct Convert<'a> {
    /// Descriptions of the bats tests, indexed by the number in the name of
    /// the function standing in for each
    bats_tests: &'a [String],
}

impl<'a> Convert<'a> {
    pub(super) fn new(bats_tests: &'a [String]) -> Self {
        Self { bats_tests }
    }

    pub(super) fn program(&self, program: ast::Program) -> Vec<Stmt> {
        program
            .complete_commands
            .into_iter()
            .flat_map(|list| self.compound_list(list))
            .collect()
    }

    fn compound_list(&self, list: ast::CompoundList) -> Vec<Stmt> {
        list.0.into_iter().map(|item| self.list_item(item)).collect()
    }

    fn list_item(&self, item: ast::CompoundListItem) -> Stmt {
        let text = format!("{}", item.0);
        let background = matches!(item.1, ast::SeparatorOperator::Async);
        Stmt {
            text,
            background,
            cmd: self.and_or_list(item.0),
        }
    }

    fn and_or_list(&self, list: ast::AndOrList) -> Command {
        let first = self.pipeline(list.first);
        if list.additional.is_empty() {
            return first;
        }
        let rest = list
            .additional
            .into_iter()
            .map(|and_or| match and_or {
                ast::AndOr::And(pipeline) => Chained {
                    op: AndOrOp::And,
                    cmd: self.pipeline(pipeline),
                },
                ast::AndOr::Or(pipeline) => Chained {
                    op: AndOrOp::Or,
                    cmd: self.pipeline(pipeline),
                },
            })
            .collect();
        Command::AndOr {
            first: Box::new(first),
            rest,
        }
    }

    fn pipeline(&self, pipeline: ast::Pipeline) -> Command {
        let negated = pipeline.bang;
        let mut cmds: Vec<Command> = pipeline
            .seq
            .into_iter()
            .map(|cmd| self.command(cmd))
            .collect();
        match cmds.pop() {
            Some(only) if cmds.is_empty() && !negated => only,
            Some(last) => {
                cmds.push(last);
                Command::Pipeline { negated, cmds }
            }
            None => Command::Pipeline { negated, cmds },
        }
    }

    fn command(&self, cmd: ast::Command) -> Command {
        match cmd {
            ast::Command::Simple(simple) => simple_command(simple),
            ast::Command::Compound(compound, redirects) => {
                self.compound_command(compound, redirect_list(redirects))
            }
            ast::Command::Function(func) => {
                let name = format!("{}", func.fname);
                let body = self.compound_command(func.body.0, redirect_list(func.body.1));
                match self.bats_description(&name) {
                    Some(description) => Command::BatsTest {
                        description,
                        body: Box::new(body),
                    },
                    None => Command::Func {
                        name,
                        body: Box::new(body),
                    },
                }
            }
            ast::Command::ExtendedTest(test) => Command::Test {
                expr: format!("{}", test.expr),
            },
        }
    }

    fn bats_description(&self, name: &str) -> Option<String> {
        let index: usize = name.strip_prefix(BATS_TEST_PREFIX)?.parse().ok()?;
        self.bats_tests.get(index).cloned()
    }

    fn compound_command(&self, cmd: ast::CompoundCommand, redirects: Vec<Redirect>) -> Command {
        match cmd {
            ast::CompoundCommand::BraceGroup(group) => Command::Block {
                stmts: self.compound_list(group.list),
                redirects,
            },
            ast::CompoundCommand::Subshell(subshell) => Command::Subshell {
                stmts: self.compound_list(subshell.list),
                redirects,
            },
            ast::CompoundCommand::ForClause(clause) => Command::For {
                name: clause.variable_name,
                items: clause
                    .values
                    .map(|words| words.iter().map(|w| format!("{w}")).collect()),
                body: self.compound_list(clause.body.list),
                redirects,
            },
            ast::CompoundCommand::ArithmeticForClause(clause) => Command::ArithFor {
                body: self.compound_list(clause.body.list),
                redirects,
            },
            ast::CompoundCommand::WhileClause(clause) => Command::While {
                until: false,
                cond: self.compound_list(clause.0),
                body: self.compound_list(clause.1.list),
                redirects,
            },
            ast::CompoundCommand::UntilClause(clause) => Command::While {
                until: true,
                cond: self.compound_list(clause.0),
                body: self.compound_list(clause.1.list),
                redirects,
            },
            ast::CompoundCommand::IfClause(clause) => {
                let mut branches = vec![Branch {
                    cond: self.compound_list(clause.condition),
                    body: self.compound_list(clause.then),
                }];
                let mut else_body = None;
                for other in clause.elses.unwrap_or_default() {
                    let body = self.compound_list(other.body);
                    match other.condition {
                        Some(cond) => branches.push(Branch {
                            cond: self.compound_list(cond),
                            body,
                        }),
                        None => else_body = Some(body),
                    }
                }
                Command::If {
                    branches,
                    else_body,
                    redirects,
                }
            }
            ast::CompoundCommand::CaseClause(clause) => Command::Case {
                word: format!("{}", clause.value),
                items: clause
                    .cases
                    .into_iter()
                    .map(|item| CaseItem {
                        patterns: item.patterns.iter().map(|p| format!("{p}")).collect(),
                        stmts: item
                            .cmd
                            .map(|list| self.compound_list(list))
                            .unwrap_or_default(),
                    })
                    .collect(),
                redirects,
            },
            ast::CompoundCommand::Arithmetic(arith) => Command::Arith {
                expr: format!("{}", arith.expr),
                redirects,
            },
        }
    }
}

fn simple_command(cmd: ast::SimpleCommand) -> Command {
    let mut assigns = Vec::new();
    let mut args = Vec::new();
    let mut redirects = Vec::new();

    for item in cmd.prefix.map(|p| p.0).unwrap_or_default() {
        match item {
            ast::CommandPrefixOrSuffixItem::AssignmentWord(assignment, _) => {
                assigns.push(assign(assignment));
            }
            other => prefix_or_suffix(other, &mut args, &mut redirects),
        }
    }
    if let Some(word) = cmd.word_or_name {
        args.push(format!("{word}"));
    }
    for item in cmd.suffix.map(|s| s.0).unwrap_or_default() {
        prefix_or_suffix(item, &mut args, &mut redirects);
    }

    Command::Call {
        assigns,
        args,
        redirects,
    }
}

/// Words and redirections; an assignment after the command name is just a
/// word, as in `export a=b`
fn prefix_or_suffix(
    item: ast::CommandPrefixOrSuffixItem,
    args: &mut Vec<String>,
    redirects: &mut Vec<Redirect>,
) {
    match item {
        ast::CommandPrefixOrSuffixItem::AssignmentWord(_, word)
        | ast::CommandPrefixOrSuffixItem::Word(word) => args.push(format!("{word}")),
        ast::CommandPrefixOrSuffixItem::IoRedirect(redirect) => redirects.push(io_redirect(redirect)),
        ast::CommandPrefixOrSuffixItem::ProcessSubstitution(kind, cmd) => {
            args.push(process_substitution(&kind, &cmd));
        }
    }
}

fn assign(assignment: ast::Assignment) -> Assign {
    let (values, array) = match &assignment.value {
        ast::AssignmentValue::Scalar(word) => (vec![format!("{word}")], false),
        ast::AssignmentValue::Array(items) => {
            (items.iter().map(|item| format!("{}", item.1)).collect(), true)
        }
    };
    Assign {
        name: format!("{}", assignment.name),
        append: assignment.append,
        values,
        array,
    }
}

fn redirect_list(list: Option<ast::RedirectList>) -> Vec<Redirect> {
    list.map(|list| list.0.into_iter().map(io_redirect).collect())
        .unwrap_or_default()
}

fn io_redirect(redirect: ast::IoRedirect) -> Redirect {
    match redirect {
        ast::IoRedirect::File(fd, kind, target) => {
            let target = match target {
                ast::IoFileRedirectTarget::Filename(w) => format!("{w}"),
                ast::IoFileRedirectTarget::Fd(n) => n.to_string(),
                ast::IoFileRedirectTarget::ProcessSubstitution(kind, cmd) => {
                    process_substitution(&kind, &cmd)
                }
                ast::IoFileRedirectTarget::Duplicate(w) => format!("{w}"),
            };
            let op = match kind {
                ast::IoFileRedirectKind::Read => "<".to_string(),
                ast::IoFileRedirectKind::Write => ">".to_string(),
                ast::IoFileRedirectKind::Append => ">>".to_string(),
                ast::IoFileRedirectKind::DuplicateInput => "<&".to_string(),
                ast::IoFileRedirectKind::DuplicateOutput => ">&".to_string(),
                other => format!("{other:?}"),
            };
            Redirect {
                fd: fd.map(|f| f as u32),
                op,
                target,
            }
        }
        ast::IoRedirect::HereDocument(fd, doc) => Redirect {
            fd: fd.map(|f| f as u32),
            op: "<<".to_string(),
            target: format!("{}", doc.doc),
        },
        ast::IoRedirect::HereString(fd, word) => Redirect {
            fd: fd.map(|f| f as u32),
            op: "<<<".to_string(),
            target: format!("{word}"),
        },
        ast::IoRedirect::OutputAndError(word, append) => Redirect {
            fd: None,
            op: if append { "&>>" } else { "&>" }.to_string(),
            target: format!("{word}"),
        },
    }
}

fn process_substitution(kind: &ast::ProcessSubstitutionKind, cmd: &ast::SubshellCommand) -> String {
    let sigil = match kind {
        ast::ProcessSubstitutionKind::Read => '<',
        ast::ProcessSubstitutionKind::Write => '>',
    };
    format!("{sigil}{cmd}")
}
