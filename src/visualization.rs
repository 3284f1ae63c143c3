//! Interactive 3D view of an explored state space using kiss3d.

use std::cell::Cell;
use std::rc::Rc;

use kiss3d::prelude::*;
use tracing::{info, warn};

use puzzlespace::board::{MoveDirection, PuzzleState};
use puzzlespace::force::ForceLayout;
use puzzlespace::game::PuzzleGame;
use puzzlespace::layout::PositionMap;
use puzzlespace::node::NodeMap;
use puzzlespace::scene::{scene_edges, DepthShading, SceneBounds};
use puzzlespace::search::SearchStrategy;
use puzzlespace::session::SolverSession;

/// Everything the viewer needs: the graph, where to start playing and where to go.
pub struct GraphView<const N: usize> {
    pub nodes: NodeMap<N>,
    pub start: PuzzleState<N>,
    pub goal: PuzzleState<N>,
    /// Depth limit of the auto-solve search.
    pub solve_depth: usize,
    pub placement: Placement<N>,
}

/// Fixed positions, or a force layout animated one iteration per frame.
pub enum Placement<const N: usize> {
    Fixed(PositionMap<N>),
    Animated(ForceLayout<N>),
}

impl<const N: usize> Placement<N> {
    fn positions(&self) -> PositionMap<N> {
        match self {
            Placement::Fixed(positions) => positions.clone(),
            Placement::Animated(layout) => layout.positions(),
        }
    }

    /// Advances an animated layout; `true` if positions changed.
    fn advance(&mut self) -> bool {
        match self {
            Placement::Fixed(_) => false,
            Placement::Animated(layout) => layout.step(),
        }
    }
}

const STATE_SIZE: f32 = 0.8;
const CURRENT_SIZE: f32 = 2.0;
const ROUTE_MARKERS_PER_EDGE: usize = 4;
const ROUTE_MARKER_SIZE: f32 = 0.3;
/// Frames between two auto-solve moves.
const AUTO_SOLVE_INTERVAL: u32 = 12;

fn route_color() -> Color {
    Color::new(1.0, 0.85, 0.1, 1.0)
}

fn current_color() -> Color {
    Color::new(1.0, 1.0, 1.0, 1.0)
}

fn depth_color(shading: &DepthShading, depth: usize) -> Color {
    let [r, g, b] = shading.color(depth);
    Color::new(r, g, b, 1.0)
}

fn to_scene(point: glam::Vec3) -> Vec3 {
    Vec3::new(point.x, point.y, point.z)
}

/// One cube per state, in node-map order.
struct RenderedState {
    node: SceneNode3d,
    depth: usize,
}

/// Adds a cube for every positioned state.
fn build_states<const N: usize>(
    scene: &mut SceneNode3d,
    nodes: &NodeMap<N>,
    positions: &PositionMap<N>,
    shading: &DepthShading,
) -> Vec<Option<RenderedState>> {
    nodes
        .iter()
        .map(|(state, data)| {
            positions.get(state).map(|&position| RenderedState {
                node: scene
                    .add_cube(STATE_SIZE, STATE_SIZE, STATE_SIZE)
                    .set_color(depth_color(shading, data.depth))
                    .set_position(to_scene(position)),
                depth: data.depth,
            })
        })
        .collect()
}

/// Small markers along every edge leading into the visited route.
fn build_route_markers<const N: usize>(
    scene: &mut SceneNode3d,
    nodes: &NodeMap<N>,
    positions: &PositionMap<N>,
    game: &PuzzleGame<N>,
) -> Vec<SceneNode3d> {
    let route = game.visited_route();
    let mut markers = Vec::new();
    for edge in scene_edges(nodes, positions, &route) {
        if !edge.on_route {
            continue;
        }
        for step in 1..=ROUTE_MARKERS_PER_EDGE {
            let t = step as f32 / (ROUTE_MARKERS_PER_EDGE + 1) as f32;
            markers.push(
                scene
                    .add_cube(ROUTE_MARKER_SIZE, ROUTE_MARKER_SIZE, ROUTE_MARKER_SIZE)
                    .set_color(route_color())
                    .set_position(to_scene(edge.from.lerp(edge.to, t))),
            );
        }
    }
    markers
}

/// Recolours every state: current state white, visited route yellow, the rest by depth.
fn paint_states<const N: usize>(
    rendered: &mut [Option<RenderedState>],
    nodes: &NodeMap<N>,
    game: &PuzzleGame<N>,
    shading: &DepthShading,
) {
    let route = game.visited_route();
    for ((state, _), slot) in nodes.iter().zip(rendered.iter_mut()) {
        let Some(cube) = slot else {
            continue;
        };
        if state == game.state() {
            cube.node.set_color(current_color());
        } else if route.contains(state) {
            cube.node.set_color(route_color());
        } else {
            cube.node.set_color(depth_color(shading, cube.depth));
        }
    }
}

/// Moves every cube to its latest position.
fn place_states<const N: usize>(
    rendered: &mut [Option<RenderedState>],
    nodes: &NodeMap<N>,
    positions: &PositionMap<N>,
) {
    for ((state, _), slot) in nodes.iter().zip(rendered.iter_mut()) {
        if let (Some(cube), Some(&position)) = (slot, positions.get(state)) {
            cube.node.set_position(to_scene(position));
        }
    }
}

fn window_title<const N: usize>(game: &PuzzleGame<N>, session: &SolverSession<N>) -> String {
    let solving = if session.accepts_manual_input() {
        String::new()
    } else {
        format!(" - solving, {} moves left", session.remaining())
    };
    format!(
        "{} moves{} - [Arrows] move, [U/Y] undo/redo, [Space] solve, [Esc] cancel, [T] reverse",
        game.history().applied().len(),
        solving
    )
}

/// Opens the viewer and blocks until the window is closed.
pub fn display<const N: usize>(view: GraphView<N>) {
    pollster::block_on(display_async(view));
}

async fn display_async<const N: usize>(mut view: GraphView<N>) {
    if view.nodes.is_empty() {
        println!("No states to display");
        return;
    }

    let mut game = PuzzleGame::new(view.start);
    let mut session = SolverSession::new();
    let dirty = Rc::new(Cell::new(true));
    let observer_flag = Rc::clone(&dirty);
    game.subscribe(move |_| observer_flag.set(true));

    let mut window = Window::new(&window_title(&game, &session)).await;

    let shading = DepthShading::new(&view.nodes);
    let mut positions = view.placement.positions();
    let radius = SceneBounds::of(&positions).map_or(10.0, |bounds| bounds.radius());

    let mut camera = OrbitCamera3d::default();
    camera.set_dist(radius * 2.5 + 8.0);

    let mut scene = SceneNode3d::empty();
    scene
        .add_light(Light::point(radius * 10.0 + 100.0))
        .set_position(Vec3::new(radius, radius, radius));

    let mut rendered = build_states(&mut scene, &view.nodes, &positions, &shading);
    let mut markers: Vec<SceneNode3d> = Vec::new();

    // arrow keys move the tile next to the empty cell unless reversed
    let mut reverse_controls = false;
    let mut frames_since_move: u32 = 0;

    loop {
        for event in window.events().iter() {
            if let kiss3d::event::WindowEvent::Key(key, action, _) = event.value {
                use kiss3d::event::{Action, Key};
                if action != Action::Press {
                    continue;
                }
                match key {
                    Key::Space => {
                        match session.start(
                            &game,
                            &view.goal,
                            SearchStrategy::BreadthFirst,
                            Some(view.solve_depth),
                        ) {
                            Ok(moves) => info!(moves, "auto-solve queued"),
                            Err(e) => warn!("auto-solve unavailable: {e}"),
                        }
                        dirty.set(true);
                    }
                    Key::Escape => {
                        session.cancel();
                        dirty.set(true);
                    }
                    Key::T => reverse_controls = !reverse_controls,
                    _ if !session.accepts_manual_input() => {}
                    Key::U => {
                        game.undo();
                    }
                    Key::Y => {
                        game.redo();
                    }
                    Key::Up | Key::Down | Key::Left | Key::Right => {
                        let tile_direction = match key {
                            Key::Up => MoveDirection::Up,
                            Key::Down => MoveDirection::Down,
                            Key::Left => MoveDirection::Left,
                            _ => MoveDirection::Right,
                        };
                        let direction = if reverse_controls {
                            tile_direction
                        } else {
                            tile_direction.inverse()
                        };
                        game.try_move(direction);
                    }
                    _ => {}
                }
            }
        }

        frames_since_move += 1;
        if frames_since_move >= AUTO_SOLVE_INTERVAL {
            frames_since_move = 0;
            session.step(&mut game);
        }

        if view.placement.advance() {
            positions = view.placement.positions();
            place_states(&mut rendered, &view.nodes, &positions);
            dirty.set(true);
        }

        if dirty.replace(false) {
            for mut marker in markers.drain(..) {
                marker.remove();
            }
            markers = build_route_markers(&mut scene, &view.nodes, &positions, &game);
            paint_states(&mut rendered, &view.nodes, &game, &shading);
            window.set_title(&window_title(&game, &session));
        }

        if !window.render_3d(&mut scene, &mut camera).await {
            break;
        }
    }
}
