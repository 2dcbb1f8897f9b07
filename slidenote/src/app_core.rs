use crate::background::{BackgroundTaskManager, Services};
use crate::commands::executor;
use crate::events::{AppCommand, DataEvent};
use crate::state::{reducer, AppState, ThreadKey};

/// Trait for handling command execution (production = real controllers + tasks, test = mock)
///
/// This trait abstracts the side effects of command execution, allowing tests
/// to inject a mock implementation that doesn't spawn background tasks or make API calls.
pub trait CommandHandler {
    /// Execute a command with access to mutable state
    fn execute_with_context(&mut self, command: AppCommand, state: &mut AppState);
}

/// Production handler: optimistic edits plus spawned controller work
pub struct TaskHandler {
    task_manager: BackgroundTaskManager,
    services: Services,
}

impl TaskHandler {
    pub fn new(services: Services) -> Self {
        Self {
            task_manager: BackgroundTaskManager::new(),
            services,
        }
    }

    pub fn task_manager(&mut self) -> &mut BackgroundTaskManager {
        &mut self.task_manager
    }
}

impl CommandHandler for TaskHandler {
    fn execute_with_context(&mut self, command: AppCommand, state: &mut AppState) {
        executor::execute_command(command, state, &mut self.task_manager, &self.services);
    }
}

/// Application core without any presentation dependencies
///
/// Generic over H (handler). The handler type determines how commands are
/// executed - in production it spawns tasks, in tests it updates state
/// synchronously.
pub struct AppCore<H: CommandHandler> {
    ui_state: AppState,
    handler: H,
}

impl<H: CommandHandler> AppCore<H> {
    pub fn new(handler: H) -> Self {
        Self {
            ui_state: AppState::new(),
            handler,
        }
    }

    /// Execute a command against current state
    pub fn dispatch(&mut self, command: AppCommand) {
        let before = self.ui_state.active_key();
        self.handler
            .execute_with_context(command, &mut self.ui_state);
        self.follow_selection(before);
    }

    /// Handle a data event (for test injection or async results)
    pub fn handle_data_event(&mut self, event: DataEvent) {
        let before = self.ui_state.active_key();
        reducer::reduce_data_event(&mut self.ui_state, event);
        self.follow_selection(before);
    }

    /// Load the thread for the slide on screen whenever it changes.
    fn follow_selection(&mut self, before: Option<ThreadKey>) {
        let after = self.ui_state.active_key();
        if let Some(key) = after {
            if before.as_ref() != Some(&key) {
                self.handler
                    .execute_with_context(AppCommand::LoadThread { key }, &mut self.ui_state);
            }
        }
    }

    pub fn state(&self) -> &AppState {
        &self.ui_state
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn should_quit(&self) -> bool {
        self.ui_state.should_quit
    }
}
