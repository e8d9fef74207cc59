use crate::api::osf::types::{InstitutionChoices, PageContext, SubscriptionNode, WikiSettingsNode};
use crate::settings::groups::GroupId;
use anyhow::Result;
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, MouseEvent};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;

#[derive(Clone, Debug)]
pub enum Event {
    Tick,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    PageContextFetched(Result<PageContext, String>),
    SubscriptionsFetched(Result<Vec<SubscriptionNode>, String>),
    WikiSettingsFetched(Result<Vec<WikiSettingsNode>, String>),
    InstitutionsFetched(Result<InstitutionChoices, String>),
    SettingsSubmitted {
        group: GroupId,
        result: Result<(), String>,
    },
}

#[derive(Debug)]
pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: std::time::Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task_tx = tx.clone();
        let _task = tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut interval = tokio::time::interval(tick_rate);
            loop {
                let tick_delay = interval.tick();
                let crossterm_event = reader.next().fuse();
                let event = tokio::select! {
                    _ = tick_delay => Some(Event::Tick),
                    Some(Ok(evt)) = crossterm_event => match evt {
                        CrosstermEvent::Key(key)
                            if key.kind == crossterm::event::KeyEventKind::Press =>
                        {
                            Some(Event::Key(key))
                        }
                        CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
                        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
                        _ => None,
                    },
                };
                if let Some(event) = event {
                    // Receiver gone means the app is shutting down.
                    if task_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });
        Self { tx, rx, _task }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Unable to get event"))
    }
}
