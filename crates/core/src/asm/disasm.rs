//! Disassembler.
//!
//! Converts a sequence of machine words starting at PC 0 back into assembly
//! text. When a label table from the originating assembly is supplied, label
//! definitions are re-emitted as standalone `NAME:` lines and branch/jump
//! targets print as labels instead of raw offsets, which is what makes the
//! assemble/disassemble round trip closed.

use crate::asm::labels::LabelTable;
use crate::common::error::AsmError;
use crate::config::IsaMode;
use crate::isa::instr::{InstrFormat, InstrKind, Instruction};
use crate::isa::table::InstructionSet;

/// Machine-word to assembly-text translator.
pub struct Disassembler {
    set: InstructionSet,
    labels: LabelTable,
}

impl Disassembler {
    /// Creates a disassembler with an empty label table.
    pub fn new(mode: IsaMode) -> Self {
        Self {
            set: InstructionSet::new(mode),
            labels: LabelTable::new(),
        }
    }

    /// Supplies the label table to consult for definitions and targets.
    pub fn set_labels(&mut self, labels: &LabelTable) {
        self.labels = labels.clone();
    }

    /// Disassembles machine words laid out at PC 0, 4, 8, ...
    ///
    /// # Arguments
    ///
    /// * `words` - The machine-code words in PC order.
    ///
    /// # Returns
    ///
    /// The assembly lines (label lines interleaved), or the first unknown
    /// encoding.
    pub fn disassemble(&self, words: &[u32]) -> Result<Vec<String>, AsmError> {
        let mut lines = Vec::with_capacity(words.len());

        for (idx, &code) in words.iter().enumerate() {
            let pc = (idx * 4) as u32;

            if let Some(name) = self.labels.definition_at(pc) {
                lines.push(format!("{}:", name));
            }

            let mut instr = *self
                .set
                .by_encoded(code)
                .ok_or(AsmError::UnknownMachineCode { pc, code })?;
            let ops = instr.decode_operands(code);

            // by_encoded cannot tell ecall from ebreak; the decoded
            // immediate settles it.
            if instr.kind == InstrKind::Ecall && ops.imm == 1 {
                if let Some(ebreak) = self.set.by_mnemonic("ebreak") {
                    instr = *ebreak;
                }
            }

            lines.push(self.format_line(&instr, ops.rd, ops.rs1, ops.rs2, ops.imm, pc));
        }

        Ok(lines)
    }

    /// Formats one instruction using the inverse of the assembler's operand
    /// shapes.
    fn format_line(&self, instr: &Instruction, rd: u32, rs1: u32, rs2: u32, imm: i32, pc: u32) -> String {
        let target = pc.wrapping_add(imm as u32);
        match instr.format {
            InstrFormat::R => format!("{} x{}, x{}, x{}", instr.mnemonic, rd, rs1, rs2),
            InstrFormat::I => {
                if instr.kind.is_system() {
                    instr.mnemonic.to_string()
                } else if instr.kind.is_load() || instr.kind == InstrKind::Jalr {
                    format!("{} x{}, {}(x{})", instr.mnemonic, rd, imm, rs1)
                } else {
                    format!("{} x{}, x{}, {}", instr.mnemonic, rd, rs1, imm)
                }
            }
            InstrFormat::S => format!("{} x{}, {}(x{})", instr.mnemonic, rs2, imm, rs1),
            InstrFormat::B => match self.labels.name_at(target) {
                Some(name) => format!("{} x{}, x{}, {}", instr.mnemonic, rs1, rs2, name),
                None => format!("{} x{}, x{}, {}", instr.mnemonic, rs1, rs2, imm),
            },
            InstrFormat::U => format!("{} x{}, {:#x}", instr.mnemonic, rd, imm),
            InstrFormat::J => match self.labels.name_at(target) {
                Some(name) => format!("{} x{}, {}", instr.mnemonic, rd, name),
                None => format!("{} x{}, {}", instr.mnemonic, rd, imm),
            },
        }
    }
}
