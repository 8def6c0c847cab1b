use tasknest_core::{Task, TaskValidationError, Urgency};

#[test]
fn new_task_is_unsaved_and_incomplete() {
    let task = Task::new("Buy milk", Urgency::Low);

    assert_eq!(task.id, None);
    assert_eq!(task.stored_id(), None);
    assert!(!task.completed);
}

#[test]
fn zero_id_counts_as_unset() {
    let mut task = Task::new("Buy milk", Urgency::Low);
    task.id = Some(0);
    assert_eq!(task.stored_id(), None);

    task.id = Some(7);
    assert_eq!(task.stored_id(), Some(7));
}

#[test]
fn toggled_flips_only_completion() {
    let mut task = Task::new("Pay rent", Urgency::High);
    task.id = Some(3);

    let done = task.toggled();
    assert!(done.completed);
    assert_eq!(done.id, Some(3));
    assert_eq!(done.name, "Pay rent");
    assert_eq!(done.urgency, Urgency::High);
    assert_eq!(done.toggled(), task);
}

#[test]
fn validate_rejects_blank_names() {
    assert_eq!(
        Task::new("   ", Urgency::Medium).validate(),
        Err(TaskValidationError::EmptyName)
    );
    assert!(Task::new("Call mom", Urgency::Medium).validate().is_ok());
}

#[test]
fn urgency_parses_labels_case_insensitively() {
    assert_eq!(" high ".parse::<Urgency>().unwrap(), Urgency::High);
    assert_eq!("Low".parse::<Urgency>().unwrap(), Urgency::Low);
    let err = "urgent".parse::<Urgency>().unwrap_err();
    assert!(err.to_string().contains("urgent"));
    assert_eq!(Urgency::default(), Urgency::Medium);
}

#[test]
fn task_serializes_with_urgency_labels() {
    let mut task = Task::new("Buy milk", Urgency::High);
    task.id = Some(1);

    let value = serde_json::to_value(&task).unwrap();
    assert_eq!(value["urgency"], "High");
    assert_eq!(value["completed"], false);

    let parsed: Task =
        serde_json::from_str(r#"{"id":null,"name":"Walk dog","urgency":"Low"}"#).unwrap();
    assert_eq!(parsed, Task::new("Walk dog", Urgency::Low));
}
