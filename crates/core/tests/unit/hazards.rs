//! Hazard-analyzer unit tests: detection, stall formulas, and CPI.

use rvlab_core::pipeline::{HazardAnalyzer, HazardKind, PipelineKind};
use rvlab_core::IsaMode;

use crate::common::{assemble, assemble_mode};

fn analyze(
    source: &str,
    mode: IsaMode,
    pipeline: PipelineKind,
    forwarding: bool,
    cache: bool,
) -> HazardAnalyzer {
    let program = assemble_mode(source, mode);
    let mut analyzer = HazardAnalyzer::new(pipeline, forwarding, cache);
    analyzer.analyze(&program.code);
    analyzer
}

// ══════════════════════════════════════════════════════════
// 1. RAW detection
// ══════════════════════════════════════════════════════════

/// Forwarded 5-stage ALU chains stall zero cycles and keep CPI at 1.
#[test]
fn forwarded_alu_chain_has_no_stalls() {
    let source = "addi x1, x0, 5\naddi x2, x1, 1\naddi x3, x2, 1\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);

    let raws: Vec<_> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::Raw)
        .collect();
    assert_eq!(raws.len(), 2);
    assert_eq!(raws[0].register, Some(1));
    assert_eq!(raws[1].register, Some(2));
    assert!(raws.iter().all(|h| h.stall_cycles == 0));

    assert_eq!(analyzer.stats().total_stalls, 0);
    assert_eq!(analyzer.stats().cpi(), Some(1.0));
}

#[test]
fn load_use_stalls_one_cycle_with_forwarding() {
    let source = "lw x1, 0(x2)\nadd x3, x1, x4\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);

    assert_eq!(analyzer.stats().raw_stalls, 1);
    assert_eq!(analyzer.stats().total_cycles, 3);
    assert_eq!(analyzer.stats().cpi(), Some(1.5));
}

#[test]
fn unforwarded_alu_dependency_stalls_two_cycles() {
    let source = "addi x1, x0, 5\nadd x2, x1, x1\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, false, false);
    assert_eq!(analyzer.stats().raw_stalls, 2);
}

#[test]
fn three_stage_only_adjacent_instructions_stall() {
    let source = "addi x1, x0, 5\nadd x2, x1, x1\nadd x3, x1, x1\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::ThreeStage, false, false);

    // Distance 1 costs one cycle; distance 2 costs nothing.
    let stalls: Vec<u32> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::Raw)
        .map(|h| h.stall_cycles)
        .collect();
    assert_eq!(stalls, vec![1, 0]);
}

#[test]
fn seven_stage_forwarded_formulas() {
    // Distance 1 and distance 3 consumers of an ALU result.
    let source = "addi x1, x0, 5\nadd x2, x1, x0\naddi x4, x0, 1\nadd x5, x1, x0\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::SevenStage, true, false);

    let raw_on_x1: Vec<u32> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::Raw && h.register == Some(1))
        .map(|h| h.stall_cycles)
        .collect();
    // max(0, 3-1) = 2 at distance 1, max(0, 3-3) = 0 at distance 3.
    assert_eq!(raw_on_x1, vec![2, 0]);
}

// ══════════════════════════════════════════════════════════
// 2. WAW / WAR
// ══════════════════════════════════════════════════════════

#[test]
fn waw_and_war_are_reported_without_stalls() {
    let source = "add x1, x2, x3\nadd x1, x4, x5\nadd x2, x6, x7\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);

    let waw: Vec<_> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::Waw)
        .collect();
    assert_eq!(waw.len(), 1);
    assert_eq!(waw[0].register, Some(1));
    assert_eq!(waw[0].stall_cycles, 0);

    // The first instruction reads x2, which the third writes.
    let war: Vec<_> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::War)
        .collect();
    assert_eq!(war.len(), 1);
    assert_eq!(war[0].register, Some(2));
    assert_eq!(war[0].stall_cycles, 0);

    assert_eq!(analyzer.stats().waw_stalls, 0);
    assert_eq!(analyzer.stats().war_stalls, 0);
}

// ══════════════════════════════════════════════════════════
// 3. Control hazards
// ══════════════════════════════════════════════════════════

#[test]
fn jal_is_free_jalr_pays_the_redirect() {
    let source = "jal x1, F\nF: jalr x0, 0(x1)\n";
    for (pipeline, expected) in [
        (PipelineKind::ThreeStage, 1),
        (PipelineKind::FiveStage, 2),
        (PipelineKind::SevenStage, 3),
    ] {
        let analyzer = analyze(source, IsaMode::Rv32i, pipeline, true, false);
        let controls: Vec<_> = analyzer
            .hazards()
            .iter()
            .filter(|h| h.kind == HazardKind::Control)
            .collect();
        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].stall_cycles, 0, "jal should be free");
        assert_eq!(controls[1].stall_cycles, expected);
        assert_eq!(analyzer.stats().control_stalls, expected);
    }
}

#[test]
fn backward_branch_mispredicts_once() {
    let source = "L: addi x5, x5, 1\naddi x6, x6, -1\nbne x6, x0, L\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);

    let controls: Vec<_> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::Control)
        .collect();
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].stall_cycles, 2);
}

#[test]
fn forward_branch_always_pays_the_penalty() {
    let source = "beq x0, x0, skip\naddi x1, x0, 1\nskip: addi x2, x0, 2\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);
    assert_eq!(analyzer.stats().control_stalls, 2);
}

// ══════════════════════════════════════════════════════════
// 4. Structural hazards
// ══════════════════════════════════════════════════════════

#[test]
fn muldiv_pair_contends_for_the_long_latency_unit() {
    let source = "mul x1, x2, x3\nmul x4, x5, x6\n";
    let analyzer = analyze(source, IsaMode::Rv32im, PipelineKind::FiveStage, true, false);

    let structural: Vec<_> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::Structural)
        .collect();
    assert_eq!(structural.len(), 1);
    assert_eq!(structural[0].stall_cycles, 2);
    assert!(structural[0].description.contains("Mul/Div Unit"));
}

#[test]
fn adjacent_memory_instructions_contend_for_the_memory_unit() {
    let source = "sw x1, 0(x2)\nlw x3, 4(x2)\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);

    let structural: Vec<_> = analyzer
        .hazards()
        .iter()
        .filter(|h| h.kind == HazardKind::Structural)
        .collect();
    assert_eq!(structural.len(), 1);
    assert_eq!(structural[0].stall_cycles, 1);
    assert!(structural[0].description.contains("Memory Access Unit"));
}

#[test]
fn separated_alu_instructions_do_not_conflict() {
    let source = "add x1, x2, x3\nadd x4, x5, x6\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);
    assert!(analyzer
        .hazards()
        .iter()
        .all(|h| h.kind != HazardKind::Structural));
}

// ══════════════════════════════════════════════════════════
// 5. Cache-miss estimates
// ══════════════════════════════════════════════════════════

#[test]
fn cache_flag_charges_loads_and_stores_per_depth() {
    let source = "lw x1, 0(x2)\nsw x1, 4(x2)\n";
    for (pipeline, penalty) in [
        (PipelineKind::ThreeStage, 5),
        (PipelineKind::FiveStage, 10),
        (PipelineKind::SevenStage, 12),
    ] {
        let analyzer = analyze(source, IsaMode::Rv32i, pipeline, true, true);
        let cache: Vec<_> = analyzer
            .hazards()
            .iter()
            .filter(|h| h.kind == HazardKind::CacheMiss)
            .collect();
        assert_eq!(cache.len(), 2);
        assert!(cache.iter().all(|h| h.stall_cycles == penalty));
        assert_eq!(analyzer.stats().cache_stalls, 2 * penalty);
    }
}

#[test]
fn without_the_cache_flag_no_cache_hazards_appear() {
    let source = "lw x1, 0(x2)\nsw x1, 4(x2)\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);
    assert!(analyzer
        .hazards()
        .iter()
        .all(|h| h.kind != HazardKind::CacheMiss));
}

// ══════════════════════════════════════════════════════════
// 6. Statistics and reporting
// ══════════════════════════════════════════════════════════

#[test]
fn total_cycles_are_instructions_plus_stalls() {
    let source = "lw x1, 0(x2)\nadd x3, x1, x4\nbne x3, x0, L\nL: addi x5, x0, 1\n";
    let analyzer = analyze(source, IsaMode::Rv32i, PipelineKind::FiveStage, true, false);

    let stats = analyzer.stats();
    assert_eq!(stats.total_instructions, 4);
    assert_eq!(stats.total_cycles, 4 + stats.total_stalls);
}

#[test]
fn analyze_is_idempotent() {
    let program = assemble("addi x1, x0, 5\nadd x2, x1, x1\n");
    let mut analyzer = HazardAnalyzer::new(PipelineKind::FiveStage, false, false);

    analyzer.analyze(&program.code);
    let first = (analyzer.hazards().len(), *analyzer.stats());
    analyzer.analyze(&program.code);
    let second = (analyzer.hazards().len(), *analyzer.stats());
    assert_eq!(first, second);
}

#[test]
fn performance_analysis_reports_cpi() {
    let program = assemble("addi x1, x0, 7\naddi x2, x1, 3\nadd x3, x1, x2\n");
    let mut analyzer = HazardAnalyzer::new(PipelineKind::FiveStage, true, false);

    let mut out = Vec::new();
    analyzer.performance_analysis(&program.code, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Program instructions: 3"), "report:\n{}", text);
    assert!(text.contains("Estimated CPI (without hazards): 1.0"), "report:\n{}", text);
    assert!(text.contains("Estimated CPI (with hazards): 1"), "report:\n{}", text);
}

#[test]
fn empty_program_has_no_cpi() {
    let mut analyzer = HazardAnalyzer::new(PipelineKind::FiveStage, true, false);
    analyzer.analyze(&[]);
    assert_eq!(analyzer.stats().cpi(), None);
}
