//! MAL parser.
//!
//! Recursive descent over the token stream, single forward pass, no
//! backtracking. The top level consumes directives (`.label`, `.default`)
//! and instructions until the tokens are exhausted; any unexpected token is
//! a fatal parse error tagged with the token's position.

use super::ast::{
    Assignment, BusRole, Condition, ControlFlow, Instruction, IoOp, LabelDirective, Operation,
    Program, Register, Shift,
};
use super::token::{Token, TokenKind};
use crate::common::{Error, Result};

/// Names that can never start a label: register names, statement keywords,
/// and operation words.
const RESERVED: &[&str] = &[
    "MAR", "MDR", "PC", "MBR", "MBRU", "SP", "LV", "CPP", "TOS", "OPC", "H", "Z", "N", "rd", "wr",
    "fetch", "if", "else", "goto", "nop", "AND", "OR", "NOT",
];

/// Single-use recursive-descent parser.
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    /// Creates a parser over a token sequence.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    /// Parses the whole token stream into a program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on any unexpected token, malformed operand
    /// combination, or missing mandatory literal. The parser does not
    /// attempt recovery.
    pub fn parse(mut self) -> Result<Program> {
        let mut program = Program::default();

        while !self.done() {
            let current = self.current()?.clone();
            if current.kind == TokenKind::DirectiveStart {
                match current.text.as_str() {
                    ".label" => {
                        let label = self.parse_label_directive()?;
                        program.labels.push(label);
                    }
                    ".default" => {
                        self.index += 1;
                        program.default = Some(self.parse_instruction()?);
                    }
                    other => {
                        return Err(self.error(format!("unknown directive `{other}`")));
                    }
                }
            } else {
                let instruction = self.parse_instruction()?;
                program.instructions.push(instruction);
            }
        }

        Ok(program)
    }

    // ── directives ─────────────────────────────────────────────

    fn parse_label_directive(&mut self) -> Result<LabelDirective> {
        self.expect(".label")?;
        let name = self.advance()?.text.clone();
        let address_text = self.advance()?.text.clone();
        let address = self.parse_store_address(&address_text)?;
        // A trailing EOL is optional at end of input.
        if !self.done() {
            self.expect("\n")?;
        }
        Ok(LabelDirective { name, address })
    }

    /// Parses a `0xHEX` control-store address literal.
    fn parse_store_address(&self, text: &str) -> Result<u16> {
        let digits = text
            .strip_prefix("0x")
            .ok_or_else(|| self.error(format!("expected a 0x address literal, found `{text}`")))?;
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error(format!("malformed address literal `{text}`")))?;
        if value >= 512 {
            return Err(Error::AddressOutOfRange(value));
        }
        Ok(value as u16)
    }

    // ── instructions ───────────────────────────────────────────

    fn parse_instruction(&mut self) -> Result<Instruction> {
        let mut instruction = Instruction::default();

        if !self.done() && !is_reserved(self.current()?) {
            instruction.label = Some(self.advance()?.text.clone());
        }

        while !self.done() && self.current()?.kind != TokenKind::Eol {
            let word = self.current()?.text.clone();
            match word.as_str() {
                "if" => self.parse_if(&mut instruction)?,
                "goto" => {
                    if self.peek_text(1) == Some("(") {
                        self.parse_multiway(&mut instruction)?;
                    } else {
                        self.parse_goto(&mut instruction)?;
                    }
                }
                "rd" => {
                    self.index += 1;
                    instruction.io = Some(IoOp::Read);
                }
                "wr" => {
                    self.index += 1;
                    instruction.io = Some(IoOp::Write);
                }
                "fetch" => {
                    self.index += 1;
                    instruction.fetch = true;
                }
                "nop" => {
                    self.index += 1;
                    instruction.nop = true;
                }
                _ => self.parse_assignment(&mut instruction)?,
            }

            if !self.done() && self.current()?.text == ";" {
                self.index += 1;
            }
        }

        // Skip the terminating EOL, if any.
        self.index += 1;
        Ok(instruction)
    }

    fn parse_if(&mut self, instruction: &mut Instruction) -> Result<()> {
        self.expect("if")?;
        self.expect("(")?;
        let cond_token = self.advance()?.text.clone();
        let cond = match cond_token.as_str() {
            "N" => Condition::N,
            "Z" => Condition::Z,
            other => {
                return Err(self.error(format!("condition must be N or Z, found `{other}`")));
            }
        };
        self.expect(")")?;
        self.expect("goto")?;
        let true_label = self.advance()?.text.clone();
        self.expect(";")?;
        self.expect("else")?;
        self.expect("goto")?;
        let false_label = self.advance()?.text.clone();

        instruction.control = Some(ControlFlow::If {
            cond,
            true_label,
            false_label,
        });
        Ok(())
    }

    fn parse_multiway(&mut self, instruction: &mut Instruction) -> Result<()> {
        self.expect("goto")?;
        self.expect("(")?;
        self.expect("MBR")?;
        let mut base = None;
        if self.current()?.text == "OR" {
            self.index += 1;
            let address_text = self.advance()?.text.clone();
            base = Some(self.parse_store_address(&address_text)?);
        }
        self.expect(")")?;

        instruction.control = Some(ControlFlow::Multiway { base });
        Ok(())
    }

    fn parse_goto(&mut self, instruction: &mut Instruction) -> Result<()> {
        self.expect("goto")?;
        let label = self.advance()?.text.clone();
        instruction.control = Some(ControlFlow::Goto(label));
        Ok(())
    }

    // ── assignments ────────────────────────────────────────────

    fn parse_assignment(&mut self, instruction: &mut Instruction) -> Result<()> {
        let mut targets = Vec::new();
        while self.peek_text(1) == Some("=") {
            let target = self.register()?;
            if !target.writable() {
                return Err(self.error(format!("register {target:?} is not writable")));
            }
            targets.push(target);
            self.index += 1; // the `=`
        }

        let (op, operands) = self.parse_operation()?;
        let shift = self.parse_shift_suffix()?;

        instruction.assignment = Some(Assignment {
            targets,
            op,
            operands,
            shift,
        });
        Ok(())
    }

    /// Parses the operation expression on the right of the last `=`.
    ///
    /// Recognizes, in priority order: `NOT X`, `-1`, `-X`, `0`, `1`, then a
    /// first operand optionally followed by `AND`/`OR`/`+`/`-` and a second
    /// term. The addition form further distinguishes `+1` (increment),
    /// `+SECOND+1` (triple sum), and plain `+SECOND`; subtraction accepts
    /// only `H` or the literal `1` as its second operand.
    fn parse_operation(&mut self) -> Result<(Operation, Vec<Register>)> {
        let word = self.current()?.text.clone();
        match word.as_str() {
            "NOT" => {
                self.index += 1;
                let operand = self.readable_register()?;
                Ok((Operation::Not, vec![operand]))
            }
            "-" => {
                if self.peek_text(1) == Some("1") {
                    self.index += 2;
                    Ok((Operation::ConstMinusOne, Vec::new()))
                } else {
                    self.index += 1;
                    let operand = self.readable_register()?;
                    Ok((Operation::Negate, vec![operand]))
                }
            }
            "0" => {
                self.index += 1;
                Ok((Operation::ConstZero, Vec::new()))
            }
            "1" => {
                self.index += 1;
                Ok((Operation::ConstOne, Vec::new()))
            }
            _ => self.parse_binary_operation(),
        }
    }

    fn parse_binary_operation(&mut self) -> Result<(Operation, Vec<Register>)> {
        let first = self.readable_register()?;
        let a_seen = first.bus_role() == Some(BusRole::A);
        let b_seen = first.bus_role() == Some(BusRole::B);

        if self.done() {
            return Ok((Operation::Identity, vec![first]));
        }

        let word = self.current()?.text.clone();
        match word.as_str() {
            "AND" => {
                self.index += 1;
                let second = self.second_operand(a_seen, b_seen)?;
                Ok((Operation::And, vec![first, second]))
            }
            "OR" => {
                self.index += 1;
                let second = self.second_operand(a_seen, b_seen)?;
                Ok((Operation::Or, vec![first, second]))
            }
            "+" => {
                self.index += 1;
                if self.current()?.text == "1" {
                    self.index += 1;
                    return Ok((Operation::Inc, vec![first]));
                }
                let second = self.second_operand(a_seen, b_seen)?;
                if self.peek_text(0) == Some("+") {
                    self.index += 1;
                    if self.current()?.text != "1" {
                        return Err(self.error("a triple sum must end with `1`".to_string()));
                    }
                    self.index += 1;
                    Ok((Operation::AddInc, vec![first, second]))
                } else {
                    Ok((Operation::Add, vec![first, second]))
                }
            }
            "-" => {
                self.index += 1;
                let second = self.advance()?.text.clone();
                match second.as_str() {
                    "1" => Ok((Operation::Dec, vec![first])),
                    "H" => Ok((Operation::Sub, vec![first, Register::H])),
                    other => {
                        Err(self.error(format!("expected `H` or `1` after `-`, found `{other}`")))
                    }
                }
            }
            _ => Ok((Operation::Identity, vec![first])),
        }
    }

    /// Parses and validates the second operand of a two-register operation:
    /// it must drive a bus not already driven by the first operand.
    fn second_operand(&mut self, a_seen: bool, b_seen: bool) -> Result<Register> {
        let second = self.readable_register()?;
        match second.bus_role() {
            Some(BusRole::A) if a_seen => {
                Err(self.error("multiple bus-A registers in one operation".to_string()))
            }
            Some(BusRole::B) if b_seen => {
                Err(self.error("multiple bus-B registers in one operation".to_string()))
            }
            _ => Ok(second),
        }
    }

    fn parse_shift_suffix(&mut self) -> Result<Option<Shift>> {
        if self.done() {
            return Ok(None);
        }
        let word = self.current()?.text.clone();
        match word.as_str() {
            "<<" => {
                self.index += 1;
                if self.current()?.text != "8" {
                    return Err(self.error("an `8` must follow `<<`".to_string()));
                }
                self.index += 1;
                Ok(Some(Shift::Left8))
            }
            ">>" => {
                self.index += 1;
                if self.current()?.text != "1" {
                    return Err(self.error("a `1` must follow `>>`".to_string()));
                }
                self.index += 1;
                Ok(Some(Shift::Right1))
            }
            _ => Ok(None),
        }
    }

    // ── token plumbing ─────────────────────────────────────────

    /// Consumes a token and resolves it as a bus-readable register.
    fn readable_register(&mut self) -> Result<Register> {
        let register = self.register()?;
        if register.bus_role().is_none() {
            return Err(self.error(format!("register {register:?} cannot drive an ALU bus")));
        }
        Ok(register)
    }

    /// Consumes a token and resolves it as a register name.
    fn register(&mut self) -> Result<Register> {
        let token = self.advance()?.clone();
        Register::from_name(&token.text)
            .ok_or_else(|| self.error(format!("expected a register, found `{token}`")))
    }

    fn expect(&mut self, text: &str) -> Result<()> {
        let token = self.advance()?.clone();
        if token.text == text {
            Ok(())
        } else {
            Err(self.error(format!("expected `{text}`, found `{token}`")))
        }
    }

    fn advance(&mut self) -> Result<&Token> {
        let token = self.tokens.get(self.index).ok_or_else(|| Error::Parse {
            token_index: self.index,
            reason: "unexpected end of input".to_string(),
        })?;
        self.index += 1;
        Ok(token)
    }

    fn current(&self) -> Result<&Token> {
        self.tokens.get(self.index).ok_or_else(|| Error::Parse {
            token_index: self.index,
            reason: "unexpected end of input".to_string(),
        })
    }

    /// The text of the token `offset` positions ahead, if it exists.
    fn peek_text(&self, offset: usize) -> Option<&str> {
        self.tokens
            .get(self.index + offset)
            .map(|t| t.text.as_str())
    }

    fn done(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn error(&self, reason: String) -> Error {
        Error::Parse {
            token_index: self.index.saturating_sub(1),
            reason,
        }
    }
}

/// Whether a token can never begin a label (register and keyword names).
fn is_reserved(token: &Token) -> bool {
    RESERVED.contains(&token.text.as_str())
}
