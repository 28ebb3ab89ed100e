use macroquad::prelude::*;
use macroquad_tiled_map::{LoadOptions, Map, ObjectKind, RenderStates, View};

fn window_conf() -> Conf {
    Conf {
        window_title: "Objects Example".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "assets/map.tmx".into());
    let screen = vec2(screen_width(), screen_height());
    let options = LoadOptions::default().with_cull_padding(32.0);
    let map = Map::load(&path, View::from_rect(Vec2::ZERO, screen), options)
        .await
        .expect("failed to load map");

    println!("layers={}", map.layers().len());
    println!("objects={}", map.objects().len());
    for kind in [
        ObjectKind::Rectangle,
        ObjectKind::Ellipse,
        ObjectKind::Polyline,
        ObjectKind::Polygon,
        ObjectKind::Graphic,
    ] {
        let n = map.objects().iter().filter(|o| o.kind() == kind).count();
        println!("  {kind:?}: {n}");
    }

    loop {
        clear_background(BLACK);

        map.draw_screen(&RenderStates::default());

        draw_text("objects example", 20.0, 30.0, 32.0, WHITE);
        next_frame().await;
    }
}
