use macroquad::prelude::*;
use macroquad_tiled_bodies::{BodyShape, Level, RoleTag};

fn window_conf() -> Conf {
    Conf {
        window_title: "Body placements".into(),
        window_width: 600,
        window_height: 800,
        ..Default::default()
    }
}

fn role_color(role: RoleTag) -> Color {
    match role {
        RoleTag::Plain => LIGHTGRAY,
        RoleTag::Hazard => RED,
        RoleTag::Bumper => YELLOW,
        RoleTag::Goal => GREEN,
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "assets/level.json".to_owned());
    let level = Level::load(&path).expect("Failed to load level");

    println!("bodies={}", level.bodies.len());
    println!("spawn={:?}", level.spawn);

    loop {
        clear_background(Color::from_rgba(0x12, 0x55, 0x55, 0xff));

        for req in &level.bodies {
            let color = role_color(req.role);
            let p = req.body.position;
            match &req.body.shape {
                BodyShape::Rectangle { width, height } => {
                    draw_rectangle_lines(p.x - width / 2.0, p.y - height / 2.0, *width, *height, 2.0, color)
                }
                BodyShape::Circle { radius } => draw_circle_lines(p.x, p.y, *radius, 2.0, color),
                BodyShape::Polygon { vertices } => {
                    for (i, a) in vertices.iter().enumerate() {
                        let b = vertices[(i + 1) % vertices.len()];
                        draw_line(p.x + a.x, p.y + a.y, p.x + b.x, p.y + b.y, 2.0, color);
                    }
                }
            }
        }

        if let Some(spawn) = level.spawn {
            draw_circle(spawn.x, spawn.y, 6.0, WHITE);
        }

        draw_text("body placements", 20.0, 30.0, 32.0, WHITE);
        next_frame().await;
    }
}
