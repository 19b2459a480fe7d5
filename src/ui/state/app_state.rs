use dioxus::prelude::{use_signal, Signal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Classrooms,
    Children,
    Families,
    Accounts,
    Transitions,
    Withdrawals,
    Ledger,
}

impl Screen {
    pub const ALL: [Screen; 7] = [
        Screen::Classrooms,
        Screen::Children,
        Screen::Families,
        Screen::Accounts,
        Screen::Transitions,
        Screen::Withdrawals,
        Screen::Ledger,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Classrooms => "Classrooms",
            Screen::Children => "Children",
            Screen::Families => "Families",
            Screen::Accounts => "Chart of Accounts",
            Screen::Transitions => "Transitions",
            Screen::Withdrawals => "Withdrawals",
            Screen::Ledger => "General Ledger",
        }
    }
}

/// Window-wide signals. Each screen keeps its own table state next to these.
#[derive(Clone, Copy, PartialEq)]
pub struct AppState {
    pub screen: Signal<Screen>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
    pub centre_name: Signal<String>,
}

impl AppState {
    pub fn new(centre_name: String) -> Self {
        Self {
            screen: use_signal(|| Screen::Classrooms),
            busy: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
            centre_name: use_signal(move || centre_name),
        }
    }
}
