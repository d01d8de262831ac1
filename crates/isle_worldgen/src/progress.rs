use std::sync::atomic::AtomicU16;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;

use bevy::prelude::*;

macro_rules! define_stages {
    ($($name:ident => $message:expr,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum WorldgenStage {
            $($name,)*
        }

        impl WorldgenStage {
            pub const COUNT: usize = [$(WorldgenStage::$name,)*].len();

            pub fn message(&self) -> &'static str {
                match self {
                    $( Self::$name => $message, )*
                }
            }

            fn from_u8(v: u8) -> Option<WorldgenStage> {
                $( if v == WorldgenStage::$name as u8 {
                    return Some(WorldgenStage::$name);
                } )*

                None
            }
        }
    }
}

define_stages! {
    Noise => "Seeding noise...",
    Terrain => "Raising the island...",
    Water => "Filling the sea...",
    Clouds => "Gathering clouds...",
    Done => "Done",
}

/// Generation progress shared between the generator and the UI.
///
/// Stage and percentage are packed into one atomic and only move forward,
/// so parallel writers may report out of order.
#[derive(Debug, Default, Clone, Resource)]
pub struct WorldgenProgress(Arc<AtomicU16>);

impl WorldgenProgress {
    pub fn set(&self, stage: WorldgenStage, progress: u8) {
        let val = (stage as u16) << 8 | (progress.min(100) as u16);
        self.0.fetch_max(val, Relaxed);
    }

    /// Returns the stage, its percentage and the overall percentage.
    pub fn get(&self) -> (WorldgenStage, u8, f32) {
        let val = self.0.load(Relaxed);
        let progress = val as u8;
        let stage = WorldgenStage::from_u8((val >> 8) as u8).unwrap_or(WorldgenStage::Done);

        if stage == WorldgenStage::Done {
            return (stage, 100, 100.0);
        }

        let step = 100.0 / (WorldgenStage::COUNT - 1) as f32;
        let frac = progress as f32 / 100.0;
        let total = step * (frac + stage as u8 as f32);

        (stage, progress, total)
    }
}
