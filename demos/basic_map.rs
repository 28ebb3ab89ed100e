use macroquad::prelude::*;
use macroquad_tiled_map::{LoadOptions, Map, RenderStates, View};

const PAN_SPEED: f32 = 300.0;

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic Map".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "assets/map.tmx".into());
    let screen = vec2(screen_width(), screen_height());
    let mut map = Map::load(&path, View::from_rect(Vec2::ZERO, screen), LoadOptions::default())
        .await
        .expect("failed to load map");

    loop {
        clear_background(BLACK);

        let mut dir = Vec2::ZERO;
        if is_key_down(KeyCode::Left) {
            dir.x -= 1.0;
        }
        if is_key_down(KeyCode::Right) {
            dir.x += 1.0;
        }
        if is_key_down(KeyCode::Up) {
            dir.y -= 1.0;
        }
        if is_key_down(KeyCode::Down) {
            dir.y += 1.0;
        }

        let view = map.view_mut();
        view.center += dir * PAN_SPEED * get_frame_time();
        view.size = vec2(screen_width(), screen_height());
        let origin = view.center - view.size / 2.0;

        // world origin sits at the top-left of the view
        map.draw_screen(&RenderStates::default().translated(-origin));

        draw_text(
            &format!("FPS: {}", get_fps()),
            screen_width() - 135.0,
            55.0,
            30.0,
            RED,
        );

        next_frame().await;
    }
}
