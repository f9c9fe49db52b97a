#![allow(clippy::type_complexity)]

use std::time::Duration;

use bevy::{input::common_conditions::input_just_pressed, math::vec2, prelude::*, utils::HashMap};

use crate::{
    engine::{CellDelta, LifeBoard},
    prelude::*,
    state::GameState,
};

pub struct LifePlugin;

impl Plugin for LifePlugin {
    fn build(&self, app: &mut App) {
        let board = LifeBoard::new(DEFAULT_ROWS, DEFAULT_COLS)
            .expect("default grid dimensions are valid");

        app.insert_resource(Life(board))
            .insert_resource(BoardLayout::new(DEFAULT_ROWS, DEFAULT_COLS))
            .insert_resource(RequestedDims {
                rows: DEFAULT_ROWS,
                cols: DEFAULT_COLS,
            })
            .init_resource::<CellEntities>()
            .insert_resource(Time::<Fixed>::from_duration(Duration::from_millis(
                UPDATE_INTERVAL_MS,
            )))
            .add_systems(
                OnEnter(GameState::Load),
                (load_meshes_and_materials, enter_setup).chain(),
            )
            .add_systems(OnEnter(GameState::Running), repaint_board)
            .add_systems(
                FixedUpdate,
                step_generation.run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (
                    handle_setup_kbd.run_if(in_state(GameState::Setup)),
                    apply_requested_dims.run_if(
                        in_state(GameState::Setup).and(input_just_pressed(KeyCode::KeyA)),
                    ),
                    spawn_board
                        .run_if(in_state(GameState::Setup).and(resource_changed::<BoardLayout>))
                        .after(apply_requested_dims),
                    toggle_setup_and_running.run_if(
                        input_just_pressed(KeyCode::Enter)
                            .and(in_state(GameState::Running).or(in_state(GameState::Setup))),
                    ),
                ),
            )
            .add_observer(hover_cell)
            .add_observer(unhover_cell)
            .add_observer(press_cell)
            .add_observer(drag_cell)
            .add_observer(release_cell);
    }
}

// ——> SYSTEMS

/// create the shared cell mesh and the material palette once, up front
fn load_meshes_and_materials(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let cell_mesh = meshes.add(Rectangle::from_size(CELL_SIZE_PX));

    let meshes = HashMap::from([("cell", cell_mesh)]);
    let materials = HashMap::from([
        (
            "border",
            materials.add(ColorMaterial::from_color(BORDER_COLOR)),
        ),
        (
            "cell_alive",
            materials.add(ColorMaterial::from_color(CELL_ALIVE_COLOR)),
        ),
        (
            "cell_dead",
            materials.add(ColorMaterial::from_color(BG_COLOR)),
        ),
        (
            "cell_clicked",
            materials.add(ColorMaterial::from_color(CELL_CLICKED_COLOR)),
        ),
        (
            "cell_hovered_alive",
            materials.add(ColorMaterial::from_color(CELL_HOVERED_ALIVE_COLOR)),
        ),
        (
            "cell_hovered_dead",
            materials.add(ColorMaterial::from_color(CELL_HOVERED_DEAD_COLOR)),
        ),
    ]);
    commands.insert_resource(MeshAndMats { meshes, materials });
}

fn enter_setup(mut game_state: ResMut<NextState<GameState>>) {
    game_state.set(GameState::Setup);
}

/// (Re)builds the board entities from the current layout: despawns whatever
/// is on screen, spawns one cell entity per grid position plus the four
/// border bars, and records the entity table used for delta recoloring.
///
/// Runs once after load and again every time new dimensions are applied;
/// a resize always recreates the cells rather than patching them in place.
fn spawn_board(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mesh_n_mats: Res<MeshAndMats>,
    layout: Res<BoardLayout>,
    life: Res<Life>,
    mut cell_entities: ResMut<CellEntities>,
    previous_board: Query<Entity, Or<(With<Cell>, With<Border>)>>,
) {
    for entity in &previous_board {
        commands.entity(entity).despawn();
    }

    let cell_mesh = mesh_n_mats.meshes.get("cell").unwrap().to_owned();
    let mut entities = Vec::with_capacity((layout.rows * layout.cols) as usize);
    for row in 0..layout.rows {
        for col in 0..layout.cols {
            let entity = commands
                .spawn((
                    Cell { row, col },
                    Mesh2d(cell_mesh.clone()),
                    MeshMaterial2d(mesh_n_mats.cell_material(life.is_alive(row, col))),
                    Transform::from_translation(layout.cell_translation(row, col))
                        .with_scale(layout.cell_scale.extend(1.0)),
                ))
                .id();
            entities.push(entity);
        }
    }
    *cell_entities = CellEntities {
        cols: layout.cols,
        entities,
    };

    let border_vert = meshes.add(Rectangle::new(
        BORDER_WIDTH_PX,
        layout.pixel_size().y + 2.0 * BORDER_WIDTH_PX,
    ));
    let border_horiz = meshes.add(Rectangle::new(
        layout.pixel_size().x + 2.0 * BORDER_WIDTH_PX,
        BORDER_WIDTH_PX,
    ));
    let border_mat = mesh_n_mats.materials.get("border").unwrap().to_owned();
    let half = (layout.pixel_size() + Vec2::splat(BORDER_WIDTH_PX)) * 0.5;
    for (mesh, offset) in [
        (border_vert.clone(), vec2(-half.x, 0.0)),
        (border_vert, vec2(half.x, 0.0)),
        (border_horiz.clone(), vec2(0.0, half.y)),
        (border_horiz, vec2(0.0, -half.y)),
    ] {
        commands.spawn((
            Border,
            Mesh2d(mesh),
            MeshMaterial2d(border_mat.clone()),
            Transform::from_translation((layout.center + offset).extend(0.0)),
        ));
    }

    info!("spawned {}x{} board", layout.rows, layout.cols);
}

/// Setup-stage keyboard controls: R randomizes the population, C clears it,
/// arrow keys stage new grid dimensions (applied separately with A).
fn handle_setup_kbd(
    mut life: ResMut<Life>,
    mut requested: ResMut<RequestedDims>,
    mut cell_query: Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    mesh_n_mats: Res<MeshAndMats>,
    keyboard_input: Res<ButtonInput<KeyCode>>,
) {
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        let density = life.randomize(None);
        info!(
            "randomized population at density {density:.1}, {} cells live",
            life.population()
        );
        repaint_all(&life, &mut cell_query, &mesh_n_mats);
    }
    if keyboard_input.just_pressed(KeyCode::KeyC) {
        life.clear();
        repaint_all(&life, &mut cell_query, &mesh_n_mats);
    }

    if keyboard_input.just_pressed(KeyCode::ArrowUp) {
        requested.rows += 1;
    }
    if keyboard_input.just_pressed(KeyCode::ArrowDown) {
        requested.rows = requested.rows.saturating_sub(1).max(1);
    }
    if keyboard_input.just_pressed(KeyCode::ArrowRight) {
        requested.cols += 1;
    }
    if keyboard_input.just_pressed(KeyCode::ArrowLeft) {
        requested.cols = requested.cols.saturating_sub(1).max(1);
    }
}

/// Pushes the staged dimensions into the engine. The engine validates them;
/// on success the layout resource changes, which triggers a board rebuild.
fn apply_requested_dims(
    requested: Res<RequestedDims>,
    mut life: ResMut<Life>,
    mut layout: ResMut<BoardLayout>,
) {
    match life.set_dimensions(requested.rows, requested.cols) {
        Ok(()) => *layout = BoardLayout::new(requested.rows, requested.cols),
        Err(err) => warn!("rejected grid dimensions: {err}"),
    }
}

fn toggle_setup_and_running(
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    match state.get() {
        GameState::Setup => next_state.set(GameState::Running),
        GameState::Running => next_state.set(GameState::Setup),
        _ => unreachable!(),
    }
}

/// flush hover/click highlights before the simulation takes over
fn repaint_board(
    life: Res<Life>,
    mut cell_query: Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    mesh_n_mats: Res<MeshAndMats>,
) {
    repaint_all(&life, &mut cell_query, &mesh_n_mats);
}

/// Advances one generation per fixed tick and recolors only the cells the
/// engine reports as changed. Stops the run (back to Setup) once the
/// population has died out.
fn step_generation(
    mut life: ResMut<Life>,
    cell_entities: Res<CellEntities>,
    mut material_query: Query<&mut MeshMaterial2d<ColorMaterial>, With<Cell>>,
    mesh_n_mats: Res<MeshAndMats>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let deltas = life.advance();
    for CellDelta { row, col, alive } in deltas {
        let Some(entity) = cell_entities.get(row, col) else {
            continue;
        };
        if let Ok(mut material) = material_query.get_mut(entity) {
            material.0 = mesh_n_mats.cell_material(alive);
        }
    }

    if life.is_empty() {
        info!(
            "population died out after {} generations, stopping",
            life.generation()
        );
        next_state.set(GameState::Setup);
    }
}

fn repaint_all(
    life: &LifeBoard,
    cell_query: &mut Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    mesh_n_mats: &MeshAndMats,
) {
    for (cell, mut material) in cell_query.iter_mut() {
        material.0 = mesh_n_mats.cell_material(life.is_alive(cell.row, cell.col));
    }
}

// ——> OBSERVERS
//
// Cell picking is only live in the setup stage; every observer bails out
// otherwise. Cells are spawned with in-range coordinates, so toggling
// through them cannot hit the engine's out-of-range rejection.

fn hover_cell(
    trigger: Trigger<Pointer<Over>>,
    mut cell_query: Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    life: Res<Life>,
    mesh_n_mats: Res<MeshAndMats>,
    state: Res<State<GameState>>,
) {
    if !matches!(state.get(), GameState::Setup) {
        return;
    }
    if let Ok((cell, mut material)) = cell_query.get_mut(trigger.entity()) {
        material.0 = mesh_n_mats.hover_material(life.is_alive(cell.row, cell.col));
    }
}

fn unhover_cell(
    trigger: Trigger<Pointer<Out>>,
    mut cell_query: Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    life: Res<Life>,
    mesh_n_mats: Res<MeshAndMats>,
    state: Res<State<GameState>>,
) {
    if !matches!(state.get(), GameState::Setup) {
        return;
    }
    if let Ok((cell, mut material)) = cell_query.get_mut(trigger.entity()) {
        material.0 = mesh_n_mats.cell_material(life.is_alive(cell.row, cell.col));
    }
}

fn press_cell(
    trigger: Trigger<Pointer<Down>>,
    mut cell_query: Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    mut life: ResMut<Life>,
    mesh_n_mats: Res<MeshAndMats>,
    state: Res<State<GameState>>,
) {
    if matches!(state.get(), GameState::Setup) {
        toggle_cell_entity(trigger.entity(), &mut cell_query, &mut life, &mesh_n_mats);
    }
}

fn drag_cell(
    trigger: Trigger<Pointer<DragOver>>,
    mut cell_query: Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    mut life: ResMut<Life>,
    mesh_n_mats: Res<MeshAndMats>,
    state: Res<State<GameState>>,
) {
    if matches!(state.get(), GameState::Setup) {
        toggle_cell_entity(trigger.entity(), &mut cell_query, &mut life, &mesh_n_mats);
    }
}

fn release_cell(
    trigger: Trigger<Pointer<Up>>,
    mut cell_query: Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    life: Res<Life>,
    mesh_n_mats: Res<MeshAndMats>,
    state: Res<State<GameState>>,
) {
    if !matches!(state.get(), GameState::Setup) {
        return;
    }
    if let Ok((cell, mut material)) = cell_query.get_mut(trigger.entity()) {
        material.0 = mesh_n_mats.hover_material(life.is_alive(cell.row, cell.col));
    }
}

fn toggle_cell_entity(
    entity: Entity,
    cell_query: &mut Query<(&Cell, &mut MeshMaterial2d<ColorMaterial>)>,
    life: &mut LifeBoard,
    mesh_n_mats: &MeshAndMats,
) {
    if let Ok((cell, mut material)) = cell_query.get_mut(entity) {
        if life.toggle_cell(cell.row, cell.col).is_ok() {
            material.0 = mesh_n_mats
                .materials
                .get("cell_clicked")
                .unwrap()
                .to_owned();
        }
    }
}

// ——> COMPONENTS

#[derive(Component)]
#[require(Mesh2d)]
struct Cell {
    row: u32,
    col: u32,
}

#[derive(Component)]
#[require(Mesh2d)]
struct Border;

// ——> RESOURCES

/// the simulation engine; all board state lives here
#[derive(Resource, Deref, DerefMut)]
struct Life(LifeBoard);

/// Dimensions staged by the user, separate from the ones applied to the
/// engine. Arrow keys edit these; A pushes them through `set_dimensions`.
#[derive(Resource, Debug, Clone, Copy)]
struct RequestedDims {
    rows: u32,
    cols: u32,
}

/// hold handles for meshes and materials
#[derive(Resource, Clone)]
struct MeshAndMats {
    meshes: HashMap<&'static str, Handle<Mesh>>,
    materials: HashMap<&'static str, Handle<ColorMaterial>>,
}

impl MeshAndMats {
    fn cell_material(&self, alive: bool) -> Handle<ColorMaterial> {
        let key = if alive { "cell_alive" } else { "cell_dead" };
        self.materials.get(key).unwrap().to_owned()
    }

    fn hover_material(&self, alive: bool) -> Handle<ColorMaterial> {
        let key = if alive {
            "cell_hovered_alive"
        } else {
            "cell_hovered_dead"
        };
        self.materials.get(key).unwrap().to_owned()
    }
}

/// Row-major table of spawned cell entities, used to map the engine's
/// deltas back onto the on-screen board.
#[derive(Resource, Default)]
struct CellEntities {
    cols: u32,
    entities: Vec<Entity>,
}

impl CellEntities {
    fn get(&self, row: u32, col: u32) -> Option<Entity> {
        self.entities
            .get((row * self.cols + col) as usize)
            .copied()
    }
}

/// Screen-space geometry of the applied board.
#[derive(Resource, Clone, Copy)]
struct BoardLayout {
    /// the center of the board
    center: Vec2,
    rows: u32,
    cols: u32,
    /// the size of each individual cell
    cell_size: Vec2,
    /// scale of each individual cell (should be 0.0 - 1.0)
    cell_scale: Vec2,
}

impl BoardLayout {
    fn new(rows: u32, cols: u32) -> Self {
        Self {
            center: BOARD_POS,
            rows,
            cols,
            cell_size: CELL_SIZE_PX,
            cell_scale: CELL_SCALE,
        }
    }

    /// computes full size of the board in pixels
    #[inline]
    fn pixel_size(&self) -> Vec2 {
        vec2(
            self.cols as f32 * self.cell_size.x,
            self.rows as f32 * self.cell_size.y,
        )
    }

    /// Screen position of a cell's center. Row 0 is the top of the board,
    /// rows grow downward.
    #[inline]
    fn cell_translation(&self, row: u32, col: u32) -> Vec3 {
        let half = self.pixel_size() * 0.5;
        let x = self.center.x - half.x + (col as f32 + 0.5) * self.cell_size.x;
        let y = self.center.y + half.y - (row as f32 + 0.5) * self.cell_size.y;
        Vec3::new(x, y, 10.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout_works() {
        let layout = BoardLayout {
            center: Vec2::ZERO,
            rows: 4,
            cols: 8,
            cell_size: Vec2::splat(16.0),
            cell_scale: Vec2::splat(0.9),
        };

        assert_eq!(vec2(128., 64.), layout.pixel_size());

        // top-left cell, then bottom-right
        assert_eq!(Vec3::new(-56., 24., 10.), layout.cell_translation(0, 0));
        assert_eq!(Vec3::new(56., -24., 10.), layout.cell_translation(3, 7));
    }

    #[test]
    fn cell_entity_table_is_row_major() {
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let c = Entity::from_raw(3);
        let table = CellEntities {
            cols: 3,
            entities: vec![a, b, c],
        };
        assert_eq!(table.get(0, 0), Some(a));
        assert_eq!(table.get(0, 2), Some(c));
        assert_eq!(table.get(1, 0), None);
    }
}
