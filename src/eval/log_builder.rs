use crate::eval::evaluator::ConditionResult;
use crate::model::config::TargetingRule;

const RULE_IGNORED_MSG: &str =
    "The current targeting rule is ignored and the evaluation continues with the next rule.";

/// Collects the indented, multi-line evaluation log emitted at Info level.
#[derive(Default)]
pub(crate) struct EvalLogBuilder {
    content: String,
    indent: usize,
}

impl EvalLogBuilder {
    const NEW_LINE_CHAR: char = '\n';
    const INDENT_SEQ: &'static str = "  ";

    pub(crate) fn inc_indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub(crate) fn dec_indent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    pub(crate) fn new_ln(&mut self, message: Option<&str>) -> &mut Self {
        self.content.push(Self::NEW_LINE_CHAR);
        for _ in 0..self.indent {
            self.content.push_str(Self::INDENT_SEQ);
        }
        if let Some(msg) = message {
            self.content.push_str(msg);
        }
        self
    }

    pub(crate) fn append(&mut self, val: &str) -> &mut Self {
        self.content.push_str(val);
        self
    }

    /// Closes a targeting rule line with its THEN part and the outcome of its conditions.
    pub(crate) fn append_then_clause(
        &mut self,
        new_line: bool,
        result: &ConditionResult,
        rule: &TargetingRule,
    ) -> &mut Self {
        self.inc_indent();
        if new_line {
            self.new_ln(None);
        } else {
            self.append(" ");
        }
        self.append("THEN ");
        match rule.served_value.as_ref() {
            Some(served) => self.append(&format!("'{}'", served.value)),
            None => self.append("% options"),
        };
        self.append(" => ");
        match result {
            ConditionResult::Done(true) => {
                self.append("MATCH, applying rule");
            }
            ConditionResult::Done(false) => {
                self.append("no match");
            }
            other => {
                self.append(&other.to_string()).new_ln(Some(RULE_IGNORED_MSG));
            }
        }
        self.dec_indent()
    }

    pub(crate) fn content(&self) -> &str {
        self.content.as_str()
    }
}
