use std::cell::RefCell;
use std::rc::Rc;

use simrv_sdk::registers::{REG_T0, REG_T1};
use simrv_sdk::{
    InstructionId, LoadedImage, LoaderError, Outcome, SimConfig, Simulator, StopReason, Trap,
    OUTPUT_PORT_ADDR,
};

const BASE: u64 = 0x100;

fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    ((imm as u32 & 0xfff) << 20) | (rs1 << 15) | (rd << 7) | 0b0010011
}

fn lui(rd: u32, imm: u32) -> u32 {
    (imm << 12) | (rd << 7) | 0b0110111
}

/// sb rs2, 0(rs1)
fn sb(rs2: u32, rs1: u32) -> u32 {
    (rs2 << 20) | (rs1 << 15) | 0b0100011
}

/// jal x0, offset
fn jump(offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | 0b1101111
}

fn image(words: &[u32]) -> LoadedImage {
    LoadedImage {
        entry: BASE,
        address: BASE,
        code: words.iter().flat_map(|word| word.to_le_bytes()).collect(),
    }
}

fn small_simulator() -> Simulator {
    Simulator::new(SimConfig { memory_size: 0x20000, max_steps: 1000 })
}

#[test]
fn test_run_writes_to_output_port() {
    let output = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&output);

    let mut sim = small_simulator();
    sim.on_output(move |byte, address| {
        assert_eq!(address, OUTPUT_PORT_ADDR);
        sink.borrow_mut().push(byte);
    });
    sim.load_image(&image(&[
        lui(6, (OUTPUT_PORT_ADDR >> 12) as u32), // lui t1, 0x10
        addi(5, 0, b'H' as i32),                 // addi t0, x0, 'H'
        sb(5, 6),                                // sb t0, 0(t1)
        addi(5, 0, b'i' as i32),                 // addi t0, x0, 'i'
        sb(5, 6),                                // sb t0, 0(t1)
        jump(0),                                 // jal x0, 0
    ]))
    .unwrap();
    assert_eq!(sim.pc(), BASE);

    let summary = sim.run(100);
    assert_eq!(summary.reason, StopReason::Stalled);
    assert_eq!(summary.steps, 6);
    assert_eq!(summary.pc, BASE + 20);
    assert_eq!(*output.borrow(), b"Hi".to_vec());
    assert_eq!(sim.register(REG_T1), Some(OUTPUT_PORT_ADDR));
    assert_eq!(sim.memory()[OUTPUT_PORT_ADDR as usize], 0);
}

#[test]
fn test_run_stops_at_step_limit() {
    let mut sim = small_simulator();
    sim.load_image(&image(&[addi(5, 5, 1), jump(-4)])).unwrap();

    let summary = sim.run(10);
    assert_eq!(summary.reason, StopReason::StepLimit);
    assert_eq!(summary.steps, 10);
    assert_eq!(sim.register(REG_T0), Some(5));
    assert_eq!(sim.steps(), 10);

    // The configured budget applies to run_to_completion
    let summary = sim.run_to_completion();
    assert_eq!(summary.steps, 1000);
    assert_eq!(sim.steps(), 1010);
}

#[test]
fn test_run_stops_on_trap() {
    let mut sim = small_simulator();
    sim.load_image(&image(&[addi(5, 0, 7), 0x00000073])).unwrap();

    let summary = sim.run(100);
    assert_eq!(
        summary.reason,
        StopReason::Trap(Trap::IllegalInstruction { id: InstructionId::Ecall, address: 0x104 })
    );
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.pc, 0x104);
    assert_eq!(sim.register(REG_T0), Some(7));

    // Stepping again traps again, nothing moves
    assert!(matches!(sim.step(), Outcome::Trap(_)));
    assert_eq!(sim.pc(), 0x104);
}

#[test]
fn test_register_access() {
    let mut sim = small_simulator();
    sim.state_mut().regs[REG_T0] = 9;
    assert_eq!(sim.register(0), Some(0));
    assert_eq!(sim.register(REG_T0), Some(9));
    assert_eq!(sim.register(31), Some(0));
    assert_eq!(sim.register(32), None);
    assert_eq!(sim.registers()[REG_T0], 9);
}

#[test]
fn test_current_instruction() {
    let mut sim = small_simulator();
    sim.load_image(&image(&[addi(5, 0, 7)])).unwrap();
    let inst = sim.current_instruction();
    assert_eq!(inst.id, InstructionId::Addi);
    assert_eq!(inst.to_string(), "addi x5, x0, 0x7");
    assert_eq!(sim.pc(), BASE);
}

#[test]
fn test_failed_load_keeps_state() {
    let mut sim = small_simulator();
    sim.load_image(&image(&[addi(5, 0, 7)])).unwrap();
    sim.step();

    assert!(matches!(sim.load(b"not an elf"), Err(LoaderError::Format(_))));
    let too_big = LoadedImage { entry: 0, address: 0x1fffc, code: vec![0x13; 8] };
    assert!(matches!(sim.load_image(&too_big), Err(LoaderError::Overflow { .. })));

    assert_eq!(sim.pc(), BASE + 4);
    assert_eq!(sim.register(REG_T0), Some(7));
    assert_eq!(sim.memory()[BASE as usize], 0x93);
}

#[test]
fn test_load_resets_previous_program() {
    let mut sim = small_simulator();
    sim.load_image(&image(&[addi(5, 0, 7), addi(6, 0, 1)])).unwrap();
    sim.run(2);

    let code = addi(7, 0, 1).to_le_bytes().to_vec();
    let next = LoadedImage { entry: 0x200, address: 0x200, code };
    sim.load_image(&next).unwrap();
    assert_eq!(sim.pc(), 0x200);
    assert_eq!(sim.register(REG_T0), Some(0));
    assert_eq!(sim.steps(), 0);
    assert!(sim.memory()[BASE as usize..BASE as usize + 8].iter().all(|&byte| byte == 0));
}

#[test]
fn test_load_file_reports_path() {
    let mut sim = Simulator::default();
    assert_eq!(sim.memory().len(), simrv_sdk::DEFAULT_MEMORY_SIZE);
    let err = sim.load_file("/nonexistent/program.elf").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/program.elf"));
}
