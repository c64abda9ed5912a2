use statescriber::diagram::{Endpoint, FiniteState, FiniteStateMachine, StateId};
use statescriber::draw::{
    BLACK, BLUE, CairoRenderer, Highlight, Palette, RED, RenderStyle, Renderer, WHITE,
    render_diagram,
};
use statescriber::geometry::Coordinate;

const SIZE: i32 = 100;

fn surface() -> cairo::ImageSurface {
    cairo::ImageSurface::create(cairo::Format::ARgb32, SIZE, SIZE).unwrap()
}

/// Runs `draw` against a renderer on `surface`, dropping the context before
/// returning so the pixels can be read.
fn with_renderer(surface: &cairo::ImageSurface, draw: impl FnOnce(&mut CairoRenderer)) {
    let ctx = cairo::Context::new(surface).unwrap();
    let mut renderer = CairoRenderer::new(ctx, RenderStyle::default());
    draw(&mut renderer);
}

/// (r, g, b) of one pixel. ARGB32 is stored as native-endian u32.
fn pixel(surface: &mut cairo::ImageSurface, x: i32, y: i32) -> (u8, u8, u8) {
    surface.flush();
    let stride = surface.stride() as usize;
    let data = surface.data().unwrap();
    let offset = y as usize * stride + x as usize * 4;
    let word = u32::from_ne_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]);
    ((word >> 16) as u8, (word >> 8) as u8, word as u8)
}

fn is_white(rgb: (u8, u8, u8)) -> bool {
    rgb == (255, 255, 255)
}

/// Darkest channel along a horizontal run, to tolerate antialiasing.
fn darkest_in_row(surface: &mut cairo::ImageSurface, xs: std::ops::RangeInclusive<i32>, y: i32) -> u8 {
    xs.map(|x| {
        let (r, g, b) = pixel(surface, x, y);
        r.min(g).min(b)
    })
    .min()
    .unwrap()
}

fn add_state(machine: &mut FiniteStateMachine, x: f64, y: f64, radius: f64) -> StateId {
    let id = machine.allocate_state_id();
    machine.add_state(FiniteState::new(id, Coordinate::new(x, y), radius))
}

#[test]
fn background_fills_surface() {
    let mut surface = surface();
    with_renderer(&surface, |renderer| {
        assert!(renderer.clear());
        renderer.draw_background(RED);
    });
    assert_eq!(pixel(&mut surface, 3, 97), (255, 0, 0));
}

#[test]
fn state_is_a_stroked_circle() {
    let mut surface = surface();
    let state = FiniteState::new(StateId(1), Coordinate::new(50.0, 50.0), 20.0);
    with_renderer(&surface, |renderer| {
        renderer.draw_background(WHITE);
        assert!(renderer.draw_state(&state, BLACK, false));
    });

    assert!(darkest_in_row(&mut surface, 68..=71, 50) < 200);
    assert!(darkest_in_row(&mut surface, 28..=31, 50) < 200);
    assert!(is_white(pixel(&mut surface, 50, 50)));
    assert!(is_white(pixel(&mut surface, 60, 50)));
}

#[test]
fn final_state_has_inner_ring() {
    let mut surface = surface();
    let mut state = FiniteState::new(StateId(1), Coordinate::new(50.0, 50.0), 20.0);
    state.set_final(true);
    with_renderer(&surface, |renderer| {
        renderer.draw_background(WHITE);
        assert!(renderer.draw_state(&state, BLACK, false));
    });

    assert!(darkest_in_row(&mut surface, 62..=65, 50) < 200);
    assert!(is_white(pixel(&mut surface, 50, 50)));
}

#[test]
fn transition_draws_edge_and_arrowhead() {
    let mut surface = surface();
    let mut machine = FiniteStateMachine::new();
    let a = add_state(&mut machine, 20.0, 50.0, 10.0);
    let b = add_state(&mut machine, 80.0, 50.0, 10.0);
    let transition = machine
        .build_transition(Endpoint::State(a), Endpoint::State(b), 0.02)
        .unwrap();
    machine.add_transition(transition).unwrap();

    with_renderer(&surface, |renderer| {
        assert!(render_diagram(
            renderer,
            &machine,
            &Palette::default(),
            Highlight::default()
        ));
    });

    // Edge between the rims
    assert!(darkest_in_row(&mut surface, 45..=45, 49) < 200 || darkest_in_row(&mut surface, 45..=45, 50) < 200);
    // Filled arrowhead just before the tip at x = 70
    assert_eq!(pixel(&mut surface, 66, 49), (0, 0, 0));
    // Nothing above the edge
    assert!(is_white(pixel(&mut surface, 45, 30)));
}

#[test]
fn selected_state_uses_selection_color() {
    let mut surface = surface();
    let mut machine = FiniteStateMachine::new();
    let id = add_state(&mut machine, 50.0, 50.0, 30.0);
    let highlight = Highlight {
        state: Some(id),
        ..Highlight::default()
    };
    let palette = Palette {
        selected: BLUE,
        ..Palette::default()
    };

    with_renderer(&surface, |renderer| {
        assert!(render_diagram(renderer, &machine, &palette, highlight));
    });

    let blue_run = (78..=81).any(|x| {
        let (r, g, b) = pixel(&mut surface, x, 50);
        b > r && b > g
    });
    assert!(blue_run);
}

#[test]
fn labels_do_not_fail_rendering() {
    let surface = surface();
    let mut state = FiniteState::new(StateId(1), Coordinate::new(50.0, 50.0), 30.0);
    state.text = "q₀\nα".to_string();
    with_renderer(&surface, |renderer| {
        assert!(renderer.draw_state(&state, BLACK, true));
    });
}
