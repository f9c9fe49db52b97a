pub mod camera;
pub mod engine;
pub mod life;
pub mod state;

pub mod prelude {
    use bevy::{color::Color, math::Vec2};

    /// fixed stepping cadence of the simulation loop
    pub const UPDATE_INTERVAL_MS: u64 = 200;
    pub const BG_COLOR: Color = Color::srgb(0.03, 0.03, 0.09);

    pub const DEFAULT_ROWS: u32 = 48;
    pub const DEFAULT_COLS: u32 = 64;
    pub const BOARD_POS: Vec2 = Vec2::ZERO;
    pub const BORDER_WIDTH_PX: f32 = 6.0;
    pub const BORDER_COLOR: Color = Color::srgb(0.85, 0.85, 0.9);

    pub const CELL_SIZE_PX: Vec2 = Vec2::splat(16.0);
    pub const CELL_SCALE: Vec2 = Vec2::splat(0.95);
    pub const CELL_ALIVE_COLOR: Color = Color::srgb(0.95, 0.76, 0.12);
    pub const CELL_CLICKED_COLOR: Color = Color::srgb(0.95, 0.25, 0.25);
    pub const CELL_HOVERED_ALIVE_COLOR: Color = Color::srgb(0.3, 0.55, 0.95);
    pub const CELL_HOVERED_DEAD_COLOR: Color = Color::srgb(0.45, 0.2, 0.55);
}
