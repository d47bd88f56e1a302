//! View model for the clip picker screen
//!
//! Holds no playback logic: it forwards selection and play taps to the
//! controller and derives what to draw from the published state.

use crate::{
    Catalog, Error, MediaEngine, MediaItem, PlaybackController, PlaybackState, PlayerConfig,
    Result,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// One entry of the segmented selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub title: String,
    pub icon: String,
    pub selected: bool,
}

/// Picker, play overlay and playback surface of one screen
pub struct PlayerView<E: MediaEngine> {
    catalog: Catalog,
    selected: usize,
    controller: PlaybackController<E>,
    state_rx: watch::Receiver<PlaybackState>,
}

impl<E: MediaEngine> PlayerView<E> {
    /// Build the screen. Must run inside a tokio runtime.
    pub fn new(catalog: Catalog, engine: Arc<E>, config: PlayerConfig) -> Result<Self> {
        config.validate(&catalog)?;
        let selected = config.initial_selection;
        let controller = PlaybackController::new(engine, config);
        let state_rx = controller.subscribe();

        Ok(Self {
            catalog,
            selected,
            controller,
            state_rx,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.catalog
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| Segment {
                title: item.title.clone(),
                icon: item.icon.clone(),
                selected: index == self.selected,
            })
            .collect()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&MediaItem> {
        self.catalog.get(self.selected)
    }

    /// Change the selected segment
    pub fn select(&mut self, index: usize) -> Result<()> {
        let Some(item) = self.catalog.get(index) else {
            return Err(Error::UnknownItem(format!("segment {}", index)));
        };
        if index == self.selected {
            return Ok(());
        }

        self.selected = index;
        self.controller.on_selection_changed(item);
        Ok(())
    }

    /// Tap on the play overlay. Returns false when the overlay is hidden.
    pub fn tap_play(&mut self) -> bool {
        if !self.play_button_visible() {
            return false;
        }
        match self.catalog.get(self.selected) {
            Some(item) => {
                self.controller.load_and_play(item);
                true
            }
            None => false,
        }
    }

    /// The overlay shows only while nothing is happening
    pub fn play_button_visible(&self) -> bool {
        *self.state_rx.borrow() == PlaybackState::Idle
    }

    pub fn error_message(&self) -> Option<String> {
        self.state_rx.borrow().error_message().map(str::to_string)
    }

    pub fn state(&self) -> PlaybackState {
        self.state_rx.borrow().clone()
    }

    /// Wait for the next publication, including republished equal states
    pub async fn changed(&mut self) -> Result<PlaybackState> {
        self.state_rx.changed().await.map_err(|_| Error::ChannelClosed)?;
        Ok(self.state_rx.borrow_and_update().clone())
    }

    pub fn controller(&self) -> &PlaybackController<E> {
        &self.controller
    }

    pub async fn flush(&self) -> Result<()> {
        self.controller.flush().await
    }
}
