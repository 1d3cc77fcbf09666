//! Per-line grammar for assembly source (part of C4/C5's front end):
//! `[ label ':' ] [ mnemonic [ operand-list ] ] [ ';' comment ]`.
//!
//! This module only tokenizes; it never resolves a label to an address
//! (that is [`super::labels`]'s job) or range-checks an immediate (that is
//! [`crate::isa::encode`]'s job).

use super::error::LexError;
use crate::registers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Text,
    Data,
}

/// An operand as tokenized from source text. `Label` is resolved to a
/// relative [`crate::isa::encode::Operand::Imm`] once the label table is
/// complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOperand {
    Reg(u8),
    Imm(i64),
    Mem { offset: i64, base: u8 },
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineContent {
    Empty,
    Section(Section),
    Data { width: u8, values: Vec<i64> },
    Instruction { mnemonic: String, operands: Vec<RawOperand> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub content: LineContent,
}

fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse a decimal, `0x`-prefixed hex, or leading-zero octal integer
/// literal, with an optional leading `-`.
pub fn parse_int(token: &str) -> Result<i64, LexError> {
    let token = token.trim();
    let (neg, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if body.is_empty() {
        return Err(LexError::BadInteger(token.to_string()));
    }
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).map_err(|_| LexError::BadInteger(token.to_string()))?
    } else if body.len() > 1 && body.starts_with('0') {
        i64::from_str_radix(&body[1..], 8).map_err(|_| LexError::BadInteger(token.to_string()))?
    } else {
        body.parse::<i64>().map_err(|_| LexError::BadInteger(token.to_string()))?
    };
    Ok(if neg { -value } else { value })
}

fn parse_operand(token: &str) -> Result<RawOperand, LexError> {
    let token = token.trim();
    if let Some(open) = token.find('(') {
        if !token.ends_with(')') {
            return Err(LexError::BadMemOperand(token.to_string()));
        }
        let offset_str = token[..open].trim();
        let reg_str = &token[open + 1..token.len() - 1];
        let offset = if offset_str.is_empty() { 0 } else { parse_int(offset_str)? };
        let base = registers::resolve(reg_str.trim())
            .map_err(|_| LexError::UnknownRegister(reg_str.trim().to_string()))?;
        return Ok(RawOperand::Mem { offset, base });
    }

    let looks_numeric = token.starts_with(|c: char| c.is_ascii_digit())
        || token.starts_with('-') && token.len() > 1 && token.as_bytes()[1].is_ascii_digit();
    if looks_numeric {
        return Ok(RawOperand::Imm(parse_int(token)?));
    }
    if let Ok(index) = registers::resolve(token) {
        return Ok(RawOperand::Reg(index));
    }
    if is_label_name(token) {
        return Ok(RawOperand::Label(token.to_string()));
    }
    Err(LexError::BadInteger(token.to_string()))
}

fn parse_operand_list(rest: &str) -> Result<Vec<RawOperand>, LexError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    rest.split(',').map(parse_operand).collect()
}

fn parse_data_values(rest: &str) -> Result<Vec<i64>, LexError> {
    rest.trim().split(',').map(|tok| parse_int(tok.trim())).collect()
}

pub fn parse_line(line: &str) -> Result<ParsedLine, LexError> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Ok(ParsedLine { label: None, content: LineContent::Empty });
    }

    let (label, rest) = match line.find(':') {
        Some(idx) => {
            let candidate = line[..idx].trim();
            if !is_label_name(candidate) {
                return Err(LexError::BadLabelName(candidate.to_string()));
            }
            (Some(candidate.to_string()), line[idx + 1..].trim())
        }
        None => (None, line),
    };

    if rest.is_empty() {
        return Ok(ParsedLine { label, content: LineContent::Empty });
    }

    let (head, tail) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    let head_lower = head.to_lowercase();

    let content = match head_lower.as_str() {
        ".text" => LineContent::Section(Section::Text),
        ".data" => LineContent::Section(Section::Data),
        ".byte" => LineContent::Data { width: 1, values: parse_data_values(tail)? },
        ".half" => LineContent::Data { width: 2, values: parse_data_values(tail)? },
        ".word" => LineContent::Data { width: 4, values: parse_data_values(tail)? },
        ".dword" => LineContent::Data { width: 8, values: parse_data_values(tail)? },
        _ if head.starts_with('.') => return Err(LexError::UnknownDirective(head.to_string())),
        _ => LineContent::Instruction { mnemonic: head.to_string(), operands: parse_operand_list(tail)? },
    };

    Ok(ParsedLine { label, content })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labeled_instruction() {
        let parsed = parse_line("loop: addi x1, x1, -1 ; decrement").unwrap();
        assert_eq!(parsed.label.as_deref(), Some("loop"));
        match parsed.content {
            LineContent::Instruction { mnemonic, operands } => {
                assert_eq!(mnemonic, "addi");
                assert_eq!(operands, vec![RawOperand::Reg(1), RawOperand::Reg(1), RawOperand::Imm(-1)]);
            }
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn parses_memory_operand() {
        let parsed = parse_line("lw a0, -8(sp)").unwrap();
        match parsed.content {
            LineContent::Instruction { operands, .. } => {
                assert_eq!(operands[1], RawOperand::Mem { offset: -8, base: 2 });
            }
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn parses_branch_with_label_operand() {
        let parsed = parse_line("beq x1, x0, done").unwrap();
        match parsed.content {
            LineContent::Instruction { operands, .. } => {
                assert_eq!(operands[2], RawOperand::Label("done".to_string()));
            }
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn parses_data_directive() {
        let parsed = parse_line(".byte 72, 0x65, 010").unwrap();
        assert_eq!(parsed.content, LineContent::Data { width: 1, values: vec![72, 0x65, 8] });
    }

    #[test]
    fn parses_label_only_line() {
        let parsed = parse_line("done:").unwrap();
        assert_eq!(parsed.label.as_deref(), Some("done"));
        assert_eq!(parsed.content, LineContent::Empty);
    }

    #[test]
    fn blank_and_comment_only_lines_are_empty() {
        assert_eq!(parse_line("   ").unwrap().content, LineContent::Empty);
        assert_eq!(parse_line("; just a comment").unwrap().content, LineContent::Empty);
    }

    #[test]
    fn rejects_unknown_directive() {
        assert!(parse_line(".quad 1").is_err());
    }

    #[test]
    fn rejects_bad_label_name() {
        assert!(parse_line("1bad: nop").is_err());
    }

    #[test]
    fn parse_int_handles_hex_octal_decimal_and_sign() {
        assert_eq!(parse_int("10").unwrap(), 10);
        assert_eq!(parse_int("-10").unwrap(), -10);
        assert_eq!(parse_int("0x1F").unwrap(), 31);
        assert_eq!(parse_int("010").unwrap(), 8);
    }
}
