use anamnesis_core::db::open_db_in_memory;
use anamnesis_core::{
    CoreConfig, EditorSession, LoadOutcome, QuestionUpdate, ServiceError,
    SqliteTemplateRepository, TemplateEditor, TemplateListQuery, TemplateService,
    ValidationIssue,
};

fn fill_minimal(editor: &mut TemplateEditor) {
    let group = editor.add_group();
    editor.rename_group(&group, "Queixa principal");
    let question = editor.add_question(&group).unwrap();
    editor.update_question(
        &group,
        &question,
        QuestionUpdate::SetText("Qual o motivo da consulta?".to_string()),
    );
}

#[test]
fn first_save_creates_and_second_save_updates() {
    let conn = open_db_in_memory().unwrap();
    let service = TemplateService::new(SqliteTemplateRepository::try_new(&conn).unwrap());

    let mut editor = TemplateEditor::with_header("Intake", "Geral");
    fill_minimal(&mut editor);

    let id = service.save(&mut editor).unwrap();
    assert_eq!(editor.template().id.as_deref(), Some(id.as_str()));

    editor.set_name("Intake revisado");
    let same_id = service.save(&mut editor).unwrap();
    assert_eq!(same_id, id);

    let listed = service.list(&TemplateListQuery::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Intake revisado");
}

#[test]
fn group_without_questions_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = TemplateService::new(SqliteTemplateRepository::try_new(&conn).unwrap());

    let mut editor = TemplateEditor::with_header("Intake", "Geral");
    let group = editor.add_group();
    editor.rename_group(&group, "Vitals");

    match service.save(&mut editor).unwrap_err() {
        ServiceError::Validation(failed) => {
            assert_eq!(failed.issues, vec![ValidationIssue::NoQuestions]);
            assert_eq!(
                failed.messages(),
                vec!["each group must have at least one question".to_string()]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!editor.is_persisted());
}

#[test]
fn open_returns_edit_mode_editor() {
    let conn = open_db_in_memory().unwrap();
    let service = TemplateService::new(SqliteTemplateRepository::try_new(&conn).unwrap());

    let mut editor = TemplateEditor::with_header("Intake", "Facial");
    fill_minimal(&mut editor);
    let id = service.save(&mut editor).unwrap();

    let reopened = service.open(&id).unwrap();
    assert_eq!(reopened, editor);
    assert!(matches!(
        service.open("missing").unwrap_err(),
        ServiceError::NotFound(id) if id == "missing"
    ));
}

#[test]
fn delete_then_save_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TemplateService::new(SqliteTemplateRepository::try_new(&conn).unwrap());

    let mut editor = TemplateEditor::with_header("Intake", "Geral");
    fill_minimal(&mut editor);
    let id = service.save(&mut editor).unwrap();

    service.delete(&id).unwrap();
    assert!(matches!(
        service.save(&mut editor).unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[test]
fn list_applies_configured_page_size() {
    let conn = open_db_in_memory().unwrap();
    let config = CoreConfig::from_lookup(|key| {
        (key == anamnesis_core::config::ENV_LIST_LIMIT).then(|| "2".to_string())
    })
    .unwrap();
    let service =
        TemplateService::with_config(SqliteTemplateRepository::try_new(&conn).unwrap(), &config);

    for index in 0..3 {
        let mut editor = TemplateEditor::with_header(format!("Modelo {index}"), "Geral");
        fill_minimal(&mut editor);
        service.save(&mut editor).unwrap();
    }

    assert_eq!(service.list(&TemplateListQuery::default()).unwrap().len(), 2);
    let wider = TemplateListQuery {
        limit: Some(10),
        ..TemplateListQuery::default()
    };
    assert_eq!(service.list(&wider).unwrap().len(), 3);
}

#[test]
fn session_load_through_service_discards_stale_fetch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();
    let service = TemplateService::new(repo);

    let mut first = TemplateEditor::with_header("Primeiro", "Geral");
    fill_minimal(&mut first);
    let first_id = service.save(&mut first).unwrap();
    let mut second = TemplateEditor::with_header("Segundo", "Geral");
    fill_minimal(&mut second);
    let second_id = service.save(&mut second).unwrap();

    let mut session = EditorSession::new();
    let stale = session.begin_load(first_id.clone());
    let current = session.begin_load(second_id.clone());

    let late = service.open(&first_id).unwrap().into_template();
    assert_eq!(
        session.complete_load(&stale, late).unwrap(),
        LoadOutcome::Discarded
    );

    let fresh = service.open(&second_id).unwrap().into_template();
    assert_eq!(
        session.complete_load(&current, fresh).unwrap(),
        LoadOutcome::Applied
    );
    assert_eq!(session.editor().unwrap().template().name, "Segundo");
}

#[test]
fn session_edit_of_loaded_template_is_saved_back() {
    let conn = open_db_in_memory().unwrap();
    let service = TemplateService::new(SqliteTemplateRepository::try_new(&conn).unwrap());

    let mut original = TemplateEditor::with_header("Intake", "Geral");
    fill_minimal(&mut original);
    let id = service.save(&mut original).unwrap();

    let mut session = EditorSession::new();
    let ticket = session.begin_load(id.clone());
    let fetched = service.open(ticket.template_id()).unwrap().into_template();
    assert_eq!(
        session.complete_load(&ticket, fetched).unwrap(),
        LoadOutcome::Applied
    );

    let editor = session.editor_mut().unwrap();
    let group = editor.template().groups[0].id.clone();
    let added = editor.add_question(&group).unwrap();
    editor.update_question(
        &group,
        &added,
        QuestionUpdate::SetText("Tem alergias?".to_string()),
    );
    editor.update_question(&group, &added, QuestionUpdate::SetRequired(true));

    let mut editor = session.take_editor().unwrap();
    assert!(session.editor().is_none());
    assert_eq!(service.save(&mut editor).unwrap(), id);

    let stored = service.open(&id).unwrap();
    let questions = &stored.template().groups[0].questions;
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1].id, added);
    assert_eq!(questions[1].text, "Tem alergias?");
    assert_eq!(questions[1].order, 2);
    assert!(questions[1].required);
    assert_eq!(service.list(&TemplateListQuery::default()).unwrap().len(), 1);
}

#[test]
fn open_repairs_stored_rank_gap() {
    let conn = open_db_in_memory().unwrap();
    let service = TemplateService::new(SqliteTemplateRepository::try_new(&conn).unwrap());

    let mut editor = TemplateEditor::with_header("Intake", "Geral");
    fill_minimal(&mut editor);
    let group = editor.template().groups[0].id.clone();
    let second = editor.add_question(&group).unwrap();
    editor.update_question(&group, &second, QuestionUpdate::SetText("Fuma?".to_string()));
    let id = service.save(&mut editor).unwrap();

    let mut gapped = editor.template().clone();
    gapped.groups[0].questions[1].order = 3;
    conn.execute(
        "UPDATE anamnesis_templates SET document = ?1 WHERE id = ?2;",
        [gapped.to_json().unwrap(), id.clone()],
    )
    .unwrap();

    let reopened = service.open(&id).unwrap();
    let orders: Vec<u32> = reopened.template().groups[0]
        .questions
        .iter()
        .map(|q| q.order)
        .collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(reopened.template().groups[0].questions[1].id, second);
}
