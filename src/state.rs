use bevy::prelude::*;

/// `Setup` is the paused editing stage (toggle cells, stage dimensions);
/// `Running` steps the simulation on the fixed timer.
#[derive(States, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Load,
    Setup,
    Running,
}
