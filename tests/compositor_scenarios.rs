use image::{Rgba, RgbaImage};
use letterbox_studio::image_handler::{
    preview_render_scale, render, resolve_canvas, CanvasSize, EditorControl, EditorState,
    ImageConfig, RenderTarget, Rotation, SourceView, TransformState,
};

const RED: Rgba<u8> = Rgba([220, 20, 20, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn render_full(raster: &RgbaImage, state: &TransformState, ratio: (u32, u32)) -> RgbaImage {
    let size = resolve_canvas(raster.width(), raster.height(), state.rotation, ratio);
    let target = RenderTarget::new(size, BLACK);
    render(&target, SourceView::from_raster(raster), state, 1.0)
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x * y) % 256) as u8, 255])
    })
}

#[test]
fn landscape_photo_gets_top_and_bottom_bars() {
    init_logger();
    let source = RgbaImage::from_pixel(800, 600, RED);
    let out = render_full(&source, &TransformState::default(), (1, 1));

    assert_eq!(out.dimensions(), (800, 800));
    for x in [0, 400, 799] {
        assert_eq!(*out.get_pixel(x, 0), BLACK);
        assert_eq!(*out.get_pixel(x, 99), BLACK);
        assert_eq!(*out.get_pixel(x, 100), RED);
        assert_eq!(*out.get_pixel(x, 699), RED);
        assert_eq!(*out.get_pixel(x, 700), BLACK);
        assert_eq!(*out.get_pixel(x, 799), BLACK);
    }
}

#[test]
fn rotated_photo_gets_side_bars() {
    init_logger();
    let source = RgbaImage::from_pixel(800, 600, RED);
    let state = TransformState {
        rotation: Rotation::Deg90,
        ..TransformState::default()
    };
    let out = render_full(&source, &state, (1, 1));

    assert_eq!(out.dimensions(), (800, 800));
    for y in [0, 400, 799] {
        assert_eq!(*out.get_pixel(99, y), BLACK);
        assert_eq!(*out.get_pixel(100, y), RED);
        assert_eq!(*out.get_pixel(699, y), RED);
        assert_eq!(*out.get_pixel(700, y), BLACK);
    }
}

#[test]
fn portrait_and_story_canvases() {
    init_logger();
    assert_eq!(
        resolve_canvas(1000, 500, Rotation::Deg0, (4, 5)),
        CanvasSize::new(1000, 1250)
    );
    assert_eq!(
        resolve_canvas(500, 2000, Rotation::Deg0, (9, 16)),
        CanvasSize::new(1125, 2000)
    );

    // 9:16 画布：图像高度占满，左右留出边框
    let source = RgbaImage::from_pixel(50, 200, RED);
    let out = render_full(&source, &TransformState::default(), (9, 16));
    assert_eq!(out.dimensions(), (113, 200));
    assert_eq!(*out.get_pixel(0, 100), BLACK);
    assert_eq!(*out.get_pixel(56, 0), RED);
    assert_eq!(*out.get_pixel(56, 199), RED);
    assert_eq!(*out.get_pixel(112, 100), BLACK);
}

#[test]
fn double_flip_cancels_half_turn() {
    init_logger();
    let source = gradient(40, 30);
    let zoomed = TransformState {
        zoom_percent: 50.0,
        ..TransformState::default()
    };
    let flipped_and_turned = TransformState {
        rotation: Rotation::Deg180,
        flip_horizontal: true,
        flip_vertical: true,
        ..zoomed
    };

    let expected = render_full(&source, &zoomed, (1, 1));
    let actual = render_full(&source, &flipped_and_turned, (1, 1));
    assert_eq!(expected.dimensions(), actual.dimensions());
    assert!(expected.pixels().zip(actual.pixels()).all(|(a, b)| a == b));

    // 缩小到 50% 后四周都是边框
    assert_eq!(*actual.get_pixel(0, 0), BLACK);
    assert_eq!(*actual.get_pixel(20, 7), BLACK);
}

#[test]
fn rotation_order_is_flip_after_rotate() {
    init_logger();
    // 左上角白色标记
    let mut source = RgbaImage::from_pixel(4, 4, RED);
    source.put_pixel(0, 0, WHITE);

    let state = TransformState {
        rotation: Rotation::Deg90,
        flip_horizontal: true,
        ..TransformState::default()
    };
    let out = render_full(&source, &state, (1, 1));
    // 先顺时针 90°（标记到右上角）再水平翻转（回到左上角）
    assert_eq!(*out.get_pixel(0, 0), WHITE);
    assert_eq!(*out.get_pixel(3, 0), RED);
}

/// 标记像素（白色）的质心。
fn marker_centroid(raster: &RgbaImage) -> (f64, f64) {
    let (mut sum_x, mut sum_y, mut count) = (0.0, 0.0, 0.0);
    for (x, y, pixel) in raster.enumerate_pixels() {
        if pixel[1] > 200 {
            sum_x += x as f64 + 0.5;
            sum_y += y as f64 + 0.5;
            count += 1.0;
        }
    }
    assert!(count > 0.0, "marker must be visible");
    (sum_x / count, sum_y / count)
}

#[test]
fn offset_lands_at_same_relative_position_in_preview_and_export() {
    init_logger();
    let mut source = RgbaImage::from_pixel(200, 100, Rgba([10, 10, 120, 255]));
    for y in 40..60 {
        for x in 40..60 {
            source.put_pixel(x, y, WHITE);
        }
    }
    let proxy = image::imageops::resize(&source, 100, 50, image::imageops::FilterType::Triangle);

    let state = TransformState {
        offset_x: 30.0,
        offset_y: -10.0,
        ..TransformState::default()
    };
    let canvas = resolve_canvas(200, 100, state.rotation, (1, 1));
    let target = RenderTarget::new(canvas, BLACK);

    let export = render(&target, SourceView::from_raster(&source), &state, 1.0);
    let (ex, ey) = marker_centroid(&export);
    assert!((ex - 80.0).abs() < 0.01 && (ey - 90.0).abs() < 0.01);

    let scale = 0.3;
    let preview_view = SourceView {
        raster: &proxy,
        natural_width: 200,
        natural_height: 100,
    };
    let preview = render(&target.scaled(scale), preview_view, &state, scale);
    assert_eq!(preview.dimensions(), (60, 60));

    let (px, py) = marker_centroid(&preview);
    assert!((px / scale - ex).abs() < 3.0, "x: {} vs {}", px / scale, ex);
    assert!((py / scale - ey).abs() < 3.0, "y: {} vs {}", py / scale, ey);
}

/// 打开编辑器，先施加 `setup`，渲染一次；再拖拽 `(dx, dy)` 后渲染，返回两次标记质心。
fn centroids_around_drag(setup: &[EditorControl], dx: f64, dy: f64) -> ((f64, f64), (f64, f64)) {
    let mut source = RgbaImage::from_pixel(40, 40, Rgba([10, 10, 120, 255]));
    for y in 14..18 {
        for x in 16..20 {
            source.put_pixel(x, y, WHITE);
        }
    }
    let config = ImageConfig::default();
    let mut editor = EditorState::default();
    editor.open(0, &TransformState::default()).expect("open");
    for control in setup {
        editor.apply_control(*control, 1.0, &config).expect("setup");
    }

    let before = *editor.working().expect("working state");
    let after = *editor
        .apply_control(EditorControl::Drag { dx, dy }, 1.0, &config)
        .expect("drag");
    (
        marker_centroid(&render_full(&source, &before, (1, 1))),
        marker_centroid(&render_full(&source, &after, (1, 1))),
    )
}

#[test]
fn dragged_image_follows_pointer_when_flipped_or_rotated() {
    init_logger();
    let cases = [
        (vec![], 5.0, 3.0),
        (vec![EditorControl::ToggleFlipHorizontal], 10.0, 0.0),
        (vec![EditorControl::ToggleFlipVertical], 0.0, -4.0),
        (vec![EditorControl::RotateClockwise], 0.0, 6.0),
        (
            vec![EditorControl::RotateCounterClockwise, EditorControl::ToggleFlipHorizontal],
            7.0,
            2.0,
        ),
    ];

    for (setup, dx, dy) in cases {
        let ((bx, by), (ax, ay)) = centroids_around_drag(&setup, dx, dy);
        assert!((ax - bx - dx).abs() < 0.5, "{:?}: x moved {} not {}", setup, ax - bx, dx);
        assert!((ay - by - dy).abs() < 0.5, "{:?}: y moved {} not {}", setup, ay - by, dy);
    }
}

#[test]
fn preview_scale_never_upscales() {
    init_logger();
    assert_eq!(preview_render_scale(CanvasSize::new(300, 200), 720), 1.0);
    let scale = preview_render_scale(CanvasSize::new(2400, 1200), 720);
    assert!((scale - 0.3).abs() < 1e-12);
    assert_eq!(CanvasSize::new(2400, 1200).scaled(scale), CanvasSize::new(720, 360));
}
