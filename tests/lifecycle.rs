//! Integration tests for the cooperative init/apply lifecycle.

mod common;

use common::{block, vanilla, BlockHandler, Blocks};
use id_registry::{LifecycleState, Phase, Registry, RegistryError, Step};

#[test]
fn test_full_lifecycle_driven_step_by_step() {
    let handler = BlockHandler::small().registering(&["torch", "ladder"]);
    let applied = handler.applied.clone();
    let mut reg: Blocks = Registry::new("blocks", handler);
    reg.register_vanilla("stone", vanilla(1, 5)).unwrap();

    reg.begin_init().unwrap();
    let mut init_steps = 0;
    while reg.resume() == Step::Pending {
        init_steps += 1;
    }
    assert_eq!(init_steps, 2);
    assert_eq!(reg.state(), LifecycleState::Initialized);
    assert_eq!(reg.id_of("torch"), Some(100));
    assert_eq!(reg.id_of("ladder"), Some(101));

    reg.begin_apply().unwrap();
    assert_eq!(reg.state(), LifecycleState::Applying);
    let mut apply_steps = 0;
    while reg.resume() == Step::Pending {
        apply_steps += 1;
    }
    assert_eq!(apply_steps, 3);
    assert_eq!(*applied.lock().unwrap(), vec![1, 100, 101]);
    assert_eq!(reg.state(), LifecycleState::Applied);
}

#[test]
fn test_driver_can_interleave_work_between_steps() {
    let handler = BlockHandler::small().registering(&["torch"]);
    let mut reg: Blocks = Registry::new("blocks", handler);

    reg.begin_init().unwrap();
    assert_eq!(reg.resume(), Step::Pending);
    // between frames the driver registers on its own
    reg.register("frame_block", block(1)).unwrap();
    assert_eq!(reg.resume(), Step::Complete);

    assert_eq!(reg.id_of("torch"), Some(100));
    assert_eq!(reg.id_of("frame_block"), Some(101));
}

#[test]
fn test_apply_sees_frozen_snapshot() {
    let handler = BlockHandler::small();
    let applied = handler.applied.clone();
    let mut reg: Blocks = Registry::new("blocks", handler);
    reg.register("early", block(1)).unwrap();

    reg.begin_apply().unwrap();
    reg.register("late", block(1)).unwrap();
    assert!(reg.unregister("early"));
    while !reg.resume().is_complete() {}

    assert_eq!(*applied.lock().unwrap(), vec![100]);
}

#[test]
fn test_apply_with_no_entries() {
    let handler = BlockHandler::small();
    let applied = handler.applied.clone();
    let mut reg: Blocks = Registry::new("blocks", handler);

    reg.run_apply().unwrap();
    assert!(applied.lock().unwrap().is_empty());
}

#[test]
fn test_phase_cannot_start_while_another_runs() {
    let handler = BlockHandler::small().registering(&["torch"]);
    let mut reg: Blocks = Registry::new("blocks", handler);

    reg.begin_init().unwrap();
    assert!(matches!(
        reg.begin_init(),
        Err(RegistryError::PhaseInProgress {
            phase: Phase::Init,
            ..
        })
    ));
    assert_eq!(reg.active_phase(), Some(Phase::Init));

    while !reg.resume().is_complete() {}
    assert_eq!(reg.active_phase(), None);
    reg.run_apply().unwrap();
}

#[test]
fn test_phase_order_is_not_enforced() {
    let mut reg: Blocks = Registry::new("blocks", BlockHandler::small());
    reg.run_apply().unwrap();
    reg.run_init().unwrap();
    assert_eq!(reg.state(), LifecycleState::Initialized);
}
