#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

use cwf::plan::{BuildError, ExecutionPlan, WorkflowBuilder};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn noop() {}

fn dependency_names(plan: &ExecutionPlan, task: &str) -> Vec<String> {
    let task = plan.get(task).expect("task must exist");
    let mut names: Vec<String> = task
        .dependencies()
        .iter()
        .map(|&dep| plan.tasks()[dep].name().to_owned())
        .collect();
    names.sort();
    names
}

fn assert_topological(plan: &ExecutionPlan) {
    for (pos, task) in plan.tasks().iter().enumerate() {
        for &dep in task.dependencies() {
            assert!(
                dep < pos,
                "`{}` at {pos} depends on position {dep}",
                task.name()
            );
        }
    }
}

#[test]
fn diamond_is_ordered_after_its_dependencies() {
    // Graph:
    //   A     B
    //    \   /
    //      C
    //      |
    //      D
    // Intentionally declared out of order to exercise forward references.
    let mut builder = WorkflowBuilder::new("diamond");
    builder
        .task_with_deps("D", noop, ["C"])
        .unwrap()
        .task_with_deps("C", noop, ["A", "B"])
        .unwrap()
        .task("B", noop)
        .unwrap()
        .task("A", noop)
        .unwrap();
    let plan = builder.build().expect("build must succeed");

    assert_eq!(plan.name(), "diamond");
    assert_eq!(plan.len(), 4);
    assert_topological(&plan);
    assert_eq!(dependency_names(&plan, "C"), ["A", "B"]);
    assert_eq!(dependency_names(&plan, "D"), ["C"]);
    assert_eq!(plan.position("D"), Some(3));
    assert_eq!(plan.position("C"), Some(2));
}

#[test]
fn ready_tasks_keep_registration_order() {
    let mut builder = WorkflowBuilder::new("flat");
    for name in ["x", "y", "z"] {
        builder.task(name, noop).unwrap();
    }
    let plan = builder.build().unwrap();
    let names: Vec<&str> = plan.tasks().iter().map(|task| task.name()).collect();
    assert_eq!(names, ["x", "y", "z"]);
}

#[test]
fn duplicate_name_is_rejected_without_changing_state() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let mut builder = WorkflowBuilder::new("dup");
    {
        let first = Arc::clone(&first);
        builder
            .task("X", move || {
                first.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
    }
    let err = {
        let second = Arc::clone(&second);
        builder
            .task_with_deps(
                "X",
                move || {
                    second.fetch_add(1, Ordering::Relaxed);
                },
                ["Y"],
            )
            .unwrap_err()
    };
    assert_eq!(
        err,
        BuildError::DuplicateTaskName {
            name: "X".to_owned()
        }
    );
    assert_eq!(builder.len(), 1);

    // The first registration survives: no dependency on the missing "Y",
    // and the first function is the one kept.
    let plan = builder.build().expect("build must succeed");
    let task = plan.get("X").unwrap();
    assert!(task.dependencies().is_empty());
    (task.function().as_ref())();
    assert_eq!(first.load(Ordering::Relaxed), 1);
    assert_eq!(second.load(Ordering::Relaxed), 0);
}

#[test]
fn missing_dependency_fails_at_build() {
    let mut builder = WorkflowBuilder::new("missing");
    builder.task_with_deps("Y", noop, ["Z"]).unwrap();
    assert!(!builder.contains("Z"));
    let err = builder.build().unwrap_err();
    assert_eq!(
        err,
        BuildError::MissingDependency {
            task: "Y".to_owned(),
            dependency: "Z".to_owned(),
        }
    );
    assert_eq!(
        err.to_string(),
        "task `Y` depends on `Z`, which was never registered"
    );
}

#[test]
fn two_task_cycle_names_both_tasks() {
    let mut builder = WorkflowBuilder::new("cycle");
    builder
        .task_with_deps("A", noop, ["B"])
        .unwrap()
        .task_with_deps("B", noop, ["A"])
        .unwrap();
    let err = builder.build().unwrap_err();
    assert_eq!(
        err,
        BuildError::CyclicDependency {
            tasks: vec!["A".to_owned(), "B".to_owned()],
        }
    );
    assert_eq!(err.to_string(), "cyclic dependency among tasks: A, B");
}

#[test]
fn cycle_report_includes_downstream_tasks_only() {
    // root -> (P <-> Q) -> tail, plus an unrelated leaf.
    let mut builder = WorkflowBuilder::new("cycle");
    builder
        .task("root", noop)
        .unwrap()
        .task_with_deps("P", noop, ["root", "Q"])
        .unwrap()
        .task_with_deps("Q", noop, ["P"])
        .unwrap()
        .task_with_deps("tail", noop, ["Q"])
        .unwrap()
        .task("leaf", noop)
        .unwrap();
    let Err(BuildError::CyclicDependency { tasks }) = builder.build() else {
        panic!("expected a cycle");
    };
    assert_eq!(tasks, ["P", "Q", "tail"]);
}

#[test]
fn self_dependency_is_a_cycle() {
    let mut builder = WorkflowBuilder::new("self");
    builder.task_with_deps("loop", noop, ["loop"]).unwrap();
    assert_eq!(
        builder.build().unwrap_err(),
        BuildError::CyclicDependency {
            tasks: vec!["loop".to_owned()],
        }
    );
}

#[test]
fn task_final_snapshots_registered_names() {
    let mut builder = WorkflowBuilder::new("final");
    builder
        .task("A", noop)
        .unwrap()
        .task("B", noop)
        .unwrap()
        .task_final("Last", noop)
        .unwrap()
        .task("After", noop)
        .unwrap();
    let plan = builder.build().unwrap();
    assert_topological(&plan);
    assert_eq!(dependency_names(&plan, "Last"), ["A", "B"]);
    assert!(plan.get("After").unwrap().dependencies().is_empty());
}

#[test]
fn task_final_on_empty_builder_has_no_dependencies() {
    let mut builder = WorkflowBuilder::new("final");
    builder.task_final("only", noop).unwrap();
    let plan = builder.build().unwrap();
    assert!(plan.tasks()[0].dependencies().is_empty());
}

#[test]
fn repeated_dependency_names_collapse() {
    let mut builder = WorkflowBuilder::new("repeat");
    builder
        .task("A", noop)
        .unwrap()
        .task_with_deps("B", noop, ["A", "A", "A"])
        .unwrap();
    let plan = builder.build().unwrap();
    assert_eq!(plan.get("B").unwrap().dependencies(), &[0]);
}

#[test]
fn empty_builder_builds_empty_plan() {
    let plan = WorkflowBuilder::default().build().unwrap();
    assert!(plan.is_empty());
    assert_eq!(plan.name(), "");
}

#[test]
fn frame_workflow_is_topological() {
    let mut builder = WorkflowBuilder::new("Frame");
    builder
        .task("Input", noop)
        .unwrap()
        .task("Network", noop)
        .unwrap()
        .task_with_deps("Camera", noop, ["Input", "Network"])
        .unwrap()
        .task_with_deps("Transforms", noop, ["Input", "Network"])
        .unwrap()
        .task_with_deps("Sky", noop, ["Camera"])
        .unwrap()
        .task_with_deps("Terrain", noop, ["Camera"])
        .unwrap()
        .task_with_deps("Dynamics", noop, ["Camera", "Transforms"])
        .unwrap()
        .task_with_deps("Post", noop, ["Sky", "Terrain", "Dynamics"])
        .unwrap()
        .task_with_deps("Gui", noop, ["Post"])
        .unwrap();
    let plan = builder.build().unwrap();
    assert_topological(&plan);
    assert_eq!(plan.tasks().last().unwrap().name(), "Gui");
    assert_eq!(
        dependency_names(&plan, "Post"),
        ["Dynamics", "Sky", "Terrain"]
    );
}

#[test]
fn plan_clones_share_tasks() {
    let mut builder = WorkflowBuilder::new("clone");
    builder.task("A", noop).unwrap();
    let plan = builder.build().unwrap();
    let copy = plan.clone();
    assert!(Arc::ptr_eq(plan.tasks()[0].function(), copy.tasks()[0].function()));
    assert_eq!(copy.iter().count(), 1);
}

#[test]
fn lookups_by_name_agree_with_plan_order() {
    let mut builder = WorkflowBuilder::new("lookup");
    builder
        .task_with_deps("late", noop, ["early"])
        .unwrap()
        .task("early", noop)
        .unwrap()
        .task_final("last", noop)
        .unwrap();
    let plan = builder.build().unwrap();
    for (pos, task) in plan.tasks().iter().enumerate() {
        assert_eq!(plan.position(task.name()), Some(pos));
        assert_eq!(plan.get(task.name()).unwrap().name(), task.name());
    }
    assert_eq!(plan.position("absent"), None);
    assert!(plan.get("absent").is_none());
}
