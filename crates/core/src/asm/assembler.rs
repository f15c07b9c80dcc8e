//! Two-pass assembler.
//!
//! This module translates textual programs into executable artifacts. It provides:
//! 1. **Label collection:** A first pass recording `name:` definitions and the
//!    source-line-to-PC map.
//! 2. **Encoding:** A second pass parsing operands per format and producing
//!    machine code alongside decoded instruction instances.
//! 3. **Artifacts:** The [`Program`] bundle consumed by the interpreter,
//!    disassembler, and hazard analyzer.
//!
//! Assembly halts at the first error; everything encoded before the failure
//! stays readable through [`Assembler::artifacts`].

use std::collections::BTreeMap;

use log::warn;

use crate::asm::labels::LabelTable;
use crate::asm::parser;
use crate::common::error::AsmError;
use crate::config::IsaMode;
use crate::isa::instr::{DecodedInstr, InstrFormat};
use crate::isa::table::InstructionSet;
use crate::isa::{abi, InstrKind};

/// The artifacts of one assembly run.
///
/// Produced fresh on each [`Assembler::assemble`]; consumers receive
/// read-only views.
#[derive(Debug, Default, Clone)]
pub struct Program {
    /// Decoded instruction instances in PC order.
    pub code: Vec<DecodedInstr>,
    /// Encoded machine words, parallel to `code`.
    pub machine_code: Vec<u32>,
    /// Labels collected in the first pass.
    pub labels: LabelTable,
    /// 1-based source line to PC, for every line that produced an instruction.
    pub line_to_pc: BTreeMap<usize, u32>,
}

impl Program {
    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns whether the program is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Returns the source line that produced the instruction at `pc`,
    /// or 0 if no line maps there.
    pub fn source_line_of(&self, pc: u32) -> usize {
        self.line_to_pc
            .iter()
            .find(|&(_, &mapped)| mapped == pc)
            .map(|(&line, _)| line)
            .unwrap_or(0)
    }

    /// Returns the PC of the instruction produced by a source line.
    pub fn pc_of_line(&self, line: usize) -> Option<u32> {
        self.line_to_pc.get(&line).copied()
    }

    /// Renders the formatted listing: `HEXPC: 8HEXCODE SOURCE` per
    /// instruction plus `HEXPC: 00000000 LABEL:` per label definition,
    /// sorted by PC with labels preceding the instruction they annotate.
    pub fn formatted_listing(&self) -> Vec<String> {
        let mut lines: Vec<(u32, bool, String)> = Vec::with_capacity(self.code.len());

        for (inst, &code) in self.code.iter().zip(&self.machine_code) {
            lines.push((inst.pc, true, format!("{:x}: {:08x} {}", inst.pc, code, inst.text)));
        }
        for (pc, name) in self.labels.iter() {
            lines.push((pc, false, format!("{:x}: {:08x} {}:", pc, 0, name)));
        }

        lines.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        lines.into_iter().map(|(_, _, text)| text).collect()
    }

    /// Renders the machine-code file format: one lowercase 8-digit hex word
    /// per line.
    pub fn hex_lines(&self) -> Vec<String> {
        self.machine_code
            .iter()
            .map(|code| format!("{:08x}", code))
            .collect()
    }
}

/// Parses the machine-code file format produced by [`Program::hex_lines`].
///
/// Blank lines are ignored; any other token must be a hex 32-bit word.
pub fn parse_hex_lines(text: &str) -> Result<Vec<u32>, AsmError> {
    let mut words = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        let word = u32::from_str_radix(token, 16).map_err(|_| AsmError::BadMachineCode {
            token: token.to_string(),
            line: idx + 1,
        })?;
        words.push(word);
    }
    Ok(words)
}

/// One instruction-bearing line surviving the first pass.
struct SourceEntry {
    text: String,
    line: usize,
    pc: u32,
}

/// Two-pass assembler for one ISA mode.
pub struct Assembler {
    set: InstructionSet,
    artifacts: Program,
}

impl Assembler {
    /// Creates an assembler admitting the given ISA mode.
    pub fn new(mode: IsaMode) -> Self {
        Self {
            set: InstructionSet::new(mode),
            artifacts: Program::default(),
        }
    }

    /// The instruction registry in use.
    pub fn isa(&self) -> &InstructionSet {
        &self.set
    }

    /// The artifacts of the most recent run, complete or partial.
    pub fn artifacts(&self) -> &Program {
        &self.artifacts
    }

    /// Discards the previous run's artifacts.
    pub fn reset(&mut self) {
        self.artifacts = Program::default();
    }

    /// Assembles a program.
    ///
    /// # Arguments
    ///
    /// * `source` - Full program text; lines are 1-based in diagnostics.
    ///
    /// # Returns
    ///
    /// The complete artifacts, or the first error. After an error the
    /// partial artifacts remain readable through [`Assembler::artifacts`].
    pub fn assemble(&mut self, source: &str) -> Result<&Program, AsmError> {
        self.reset();
        let entries = self.collect_labels(source);
        for entry in &entries {
            self.encode_line(entry)?;
        }
        Ok(&self.artifacts)
    }

    /// First pass: collect label definitions, keep instruction lines, and
    /// build the source-line-to-PC map. PC starts at 0 and advances 4 bytes
    /// per instruction-bearing line.
    fn collect_labels(&mut self, source: &str) -> Vec<SourceEntry> {
        let mut entries = Vec::new();
        let mut index = 0u32;

        for (line_idx, raw) in source.lines().enumerate() {
            let mut text = parser::clean_line(raw);
            if text.is_empty() {
                continue;
            }

            let pc = index * 4;
            if let Some(colon) = text.find(':') {
                let label = text[..colon].trim();
                self.artifacts.labels.insert(pc, label, true);
                text = text[colon + 1..].trim();
            }

            if !text.is_empty() {
                entries.push(SourceEntry {
                    text: text.to_string(),
                    line: line_idx + 1,
                    pc,
                });
                self.artifacts.line_to_pc.insert(line_idx + 1, pc);
                index += 1;
            }
        }
        entries
    }

    /// Second pass for one line: look up the mnemonic, parse operands per
    /// format, and append the encoded word and decoded instance.
    fn encode_line(&mut self, entry: &SourceEntry) -> Result<(), AsmError> {
        let (mnemonic, rest) = parser::split_mnemonic(&entry.text);
        let operands = parser::split_operands(rest);

        let instr = *self
            .set
            .by_mnemonic(mnemonic)
            .ok_or_else(|| AsmError::UnknownMnemonic {
                line: entry.line,
                mnemonic: mnemonic.to_string(),
            })?;

        let count_err = |expected: &'static str| AsmError::OperandCount {
            line: entry.line,
            mnemonic: mnemonic.to_string(),
            expected,
            got: operands.len(),
        };

        let mut rd = 0;
        let mut rs1 = 0;
        let mut rs2 = 0;
        let mut imm = 0i32;

        match instr.format {
            InstrFormat::R => {
                if operands.len() != 3 {
                    return Err(count_err("3"));
                }
                rd = self.register(operands[0], entry.line)?;
                rs1 = self.register(operands[1], entry.line)?;
                rs2 = self.register(operands[2], entry.line)?;
            }
            InstrFormat::I if instr.kind.is_system() => {
                // ecall/ebreak take no operands; the immediate is their
                // encoding discriminator.
                if !operands.is_empty() {
                    return Err(count_err("0"));
                }
                imm = if instr.kind == InstrKind::Ebreak { 1 } else { 0 };
            }
            InstrFormat::I => {
                match operands.len() {
                    2 if instr.kind.is_load() || instr.kind == InstrKind::Jalr => {
                        rd = self.register(operands[0], entry.line)?;
                        let (i, r) = self.memory_operand(operands[1], entry.line, entry.pc)?;
                        imm = i;
                        rs1 = r;
                    }
                    3 => {
                        rd = self.register(operands[0], entry.line)?;
                        rs1 = self.register(operands[1], entry.line)?;
                        imm = self.immediate(operands[2], entry.line, entry.pc)?;
                    }
                    _ => return Err(count_err("2 or 3")),
                }
            }
            InstrFormat::S => {
                if operands.len() != 2 {
                    return Err(count_err("2"));
                }
                rs2 = self.register(operands[0], entry.line)?;
                let (i, r) = self.memory_operand(operands[1], entry.line, entry.pc)?;
                imm = i;
                rs1 = r;
            }
            InstrFormat::B => {
                if operands.len() != 3 {
                    return Err(count_err("3"));
                }
                rs1 = self.register(operands[0], entry.line)?;
                rs2 = self.register(operands[1], entry.line)?;
                imm = self.immediate(operands[2], entry.line, entry.pc)?;
            }
            InstrFormat::U => {
                if operands.len() != 2 {
                    return Err(count_err("2"));
                }
                rd = self.register(operands[0], entry.line)?;
                imm = self.immediate(operands[1], entry.line, entry.pc)?;
                if !(0..1 << 20).contains(&imm) {
                    warn!(
                        "[line {}] U-type immediate {} truncated to 20 bits",
                        entry.line, imm
                    );
                }
            }
            InstrFormat::J => {
                if operands.len() != 2 {
                    return Err(count_err("2"));
                }
                rd = self.register(operands[0], entry.line)?;
                imm = self.immediate(operands[1], entry.line, entry.pc)?;
            }
        }

        self.artifacts.machine_code.push(instr.encode(rd, rs1, rs2, imm));
        self.artifacts.code.push(DecodedInstr {
            instr,
            rd,
            rs1,
            rs2,
            imm,
            pc: entry.pc,
            text: entry.text.clone(),
        });
        Ok(())
    }

    /// Parses a register token (`x0`-`x31` or an ABI alias).
    fn register(&self, token: &str, line: usize) -> Result<u32, AsmError> {
        abi::parse_register(token).ok_or_else(|| AsmError::InvalidRegister {
            token: token.to_string(),
            line,
        })
    }

    /// Parses an immediate: a known label resolves PC-relative, anything
    /// else parses as a signed integer with auto-detected base.
    fn immediate(&self, token: &str, line: usize, pc: u32) -> Result<i32, AsmError> {
        if let Some(target) = self.artifacts.labels.pc_of(token) {
            return Ok(target as i32 - pc as i32);
        }

        match parser::parse_int(token) {
            Some(value) => Ok(value as i32),
            None => {
                // A label-shaped token is an undefined label, not a malformed
                // number.
                let label_like = token
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
                if label_like {
                    Err(AsmError::UndefinedLabel {
                        token: token.to_string(),
                        line,
                    })
                } else {
                    Err(AsmError::InvalidImmediate {
                        token: token.to_string(),
                        line,
                    })
                }
            }
        }
    }

    /// Parses a memory operand of the form `imm(reg)`.
    fn memory_operand(&self, token: &str, line: usize, pc: u32) -> Result<(i32, u32), AsmError> {
        let bad = || AsmError::InvalidMemoryOperand {
            token: token.to_string(),
            line,
        };

        let open = token.find('(').ok_or_else(bad)?;
        let close = token.rfind(')').ok_or_else(bad)?;
        if close <= open + 1 {
            return Err(bad());
        }

        let imm_part = token[..open].trim();
        let reg_part = token[open + 1..close].trim();

        // An absent displacement means zero, as in `jalr x0, (x1)`.
        let imm = if imm_part.is_empty() {
            0
        } else {
            self.immediate(imm_part, line, pc)?
        };
        let rs1 = self.register(reg_part, line)?;
        Ok((imm, rs1))
    }
}
