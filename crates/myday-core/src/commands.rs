use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::app::App;
use crate::cli::{Command, FormArgs};
use crate::datetime::{Clock, format_date};
use crate::editor::{Submitted, TaskForm};
use crate::render::Renderer;
use crate::storage::KeyValueStorage;
use crate::view::View;

#[instrument(skip(app, renderer, command))]
pub fn dispatch<S, C>(
    app: &mut App<S, C>,
    renderer: &mut Renderer,
    active: View,
    command: Option<Command>,
) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    C: Clock,
{
    app.render_view(active);
    let command = command.unwrap_or(Command::View { key: None });
    debug!(?command, "dispatching command");

    match command {
        Command::View { key } => cmd_view(app, renderer, key.as_deref()),
        Command::Add(form) => cmd_add(app, renderer, &form),
        Command::Edit { id, form } => cmd_edit(app, renderer, id, &form),
        Command::Toggle { id } => {
            info!(id, "command toggle");
            let page = app
                .handle_toggle_complete(id)
                .context("failed to save tasks")?;
            renderer.print_page(&page)
        }
        Command::Star { id } => {
            info!(id, "command star");
            let page = app
                .handle_toggle_important(id)
                .context("failed to save tasks")?;
            renderer.print_page(&page)
        }
        Command::Delete { id } => {
            info!(id, "command delete");
            let page = app.handle_delete(id).context("failed to save tasks")?;
            renderer.print_page(&page)
        }
        Command::Show { id } => cmd_show(app, renderer, id),
    }
}

fn cmd_view<S, C>(
    app: &mut App<S, C>,
    renderer: &mut Renderer,
    key: Option<&str>,
) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    C: Clock,
{
    let view = key.map(View::from_key).unwrap_or(app.active_view());
    info!(%view, "command view");
    let page = app.render_view(view);
    renderer.print_page(&page)
}

fn cmd_add<S, C>(app: &mut App<S, C>, renderer: &mut Renderer, args: &FormArgs) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    C: Clock,
{
    info!("command add");
    app.open_editor(None);
    let due = resolve_due(args, app.clock());
    apply_form_args(app.editor_mut().form_mut(), args, due);

    let (outcome, page) = app.submit_editor().context("failed to add task")?;
    if let Submitted::Created(id) = outcome {
        println!("Created task {id}.");
    }
    renderer.print_page(&page)
}

fn cmd_edit<S, C>(
    app: &mut App<S, C>,
    renderer: &mut Renderer,
    id: u64,
    args: &FormArgs,
) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    C: Clock,
{
    info!(id, "command edit");
    if !app.open_editor(Some(id)) {
        warn!(id, "no task to edit");
        println!("No task with id {id}.");
        return Ok(());
    }

    let due = resolve_due(args, app.clock());
    apply_form_args(app.editor_mut().form_mut(), args, due);

    let (outcome, page) = app.submit_editor().context("failed to edit task")?;
    if let Submitted::Updated(id) = outcome {
        println!("Updated task {id}.");
    }
    renderer.print_page(&page)
}

fn cmd_show<S, C>(app: &mut App<S, C>, renderer: &mut Renderer, id: u64) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    C: Clock,
{
    info!(id, "command show");
    if !app.open_editor(Some(id)) {
        println!("No task with id {id}.");
        return Ok(());
    }
    renderer.print_form(app.editor().form(), app.editor().editing_id())?;
    app.cancel_editor();
    Ok(())
}

fn resolve_due(args: &FormArgs, clock: &impl Clock) -> Option<String> {
    if args.today {
        Some(format_date(clock.today()))
    } else if args.tomorrow {
        Some(format_date(clock.tomorrow()))
    } else {
        args.due.clone()
    }
}

/// Copies the flags that were given onto `form`, leaving the rest as they
/// were prefilled.
pub fn apply_form_args(form: &mut TaskForm, args: &FormArgs, due: Option<String>) {
    if let Some(title) = &args.title {
        form.title = title.clone();
    }
    if let Some(description) = &args.description {
        form.description = description.clone();
    }
    if let Some(due) = due {
        form.due_date = due;
    }
    if let Some(priority) = args.priority {
        form.priority = priority;
    }
    if let Some(tags) = &args.tags {
        form.tags = tags.clone();
    }
    if let Some(status) = args.status {
        form.status = status;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{apply_form_args, dispatch, resolve_due};
    use crate::app::App;
    use crate::cli::{Command, FormArgs};
    use crate::datetime::FixedClock;
    use crate::editor::TaskForm;
    use crate::render::Renderer;
    use crate::storage::MemoryStorage;
    use crate::store::TaskStore;
    use crate::task::{Priority, Status};
    use crate::view::View;

    fn clock() -> FixedClock {
        FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"),
            7_000,
        )
    }

    fn app() -> App<MemoryStorage, FixedClock> {
        let store = TaskStore::load(MemoryStorage::new(), "allTasks", &clock()).expect("load");
        App::new(store, clock())
    }

    #[test]
    fn quick_date_flags_win_over_nothing() {
        let args = FormArgs {
            tomorrow: true,
            ..FormArgs::default()
        };
        assert_eq!(resolve_due(&args, &clock()).as_deref(), Some("2027-01-01"));
        assert_eq!(resolve_due(&FormArgs::default(), &clock()), None);
    }

    #[test]
    fn only_given_flags_overwrite_the_form() {
        let mut form = TaskForm {
            title: "Keep".to_string(),
            tags: "a, b".to_string(),
            ..TaskForm::default()
        };
        let args = FormArgs {
            priority: Some(Priority::High),
            status: Some(Status::Done),
            ..FormArgs::default()
        };
        apply_form_args(&mut form, &args, None);
        assert_eq!(form.title, "Keep");
        assert_eq!(form.tags, "a, b");
        assert_eq!(form.priority, Priority::High);
        assert_eq!(form.status, Status::Done);
    }

    #[test]
    fn edit_command_keeps_unspecified_fields() {
        let mut app = app();
        let id = app.store().tasks()[1].id;
        let args = FormArgs {
            priority: Some(Priority::High),
            ..FormArgs::default()
        };

        dispatch(
            &mut app,
            &mut Renderer::plain(),
            View::AllTasks,
            Some(Command::Edit { id, form: args }),
        )
        .expect("edit");

        let task = app.store().find_by_id(id).expect("task");
        assert_eq!(task.title, "Front End Campus");
        assert_eq!(task.tags, ["Work"]);
        assert!(task.is_important);
        assert!(!app.editor().is_open());
    }

    #[test]
    fn add_without_title_is_rejected() {
        let mut app = app();
        let result = dispatch(
            &mut app,
            &mut Renderer::plain(),
            View::MyDay,
            Some(Command::Add(FormArgs::default())),
        );
        assert!(result.is_err());
        assert_eq!(app.store().tasks().len(), 2);
    }
}
