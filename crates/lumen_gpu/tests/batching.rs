//! Draw list batching behavior

mod common;

use common::{distance_field, monospace, rgba_image, ATLAS, SDF_ATLAS};
use lumen_core::{Affine2D, Color, Point, Rect, TextureFormat, TextureId};
use lumen_gpu::draw_list::{CROP_UNIFORM, OUTLINE_COLOR_UNIFORM, OUTLINE_WIDTH_UNIFORM};
use lumen_gpu::{
    BlendMode, BuiltinProgram, DeferredOp, DrawList, DrawListConfig, DrawMode, PrimitiveType,
    ProgramRef, ProgramSetup,
};
use lumen_paint::{CornerFlags, Gradient, Polyline, Vertex};
use lumen_text::{Outline, RichText, Text};

fn builtin(program: BuiltinProgram) -> ProgramRef {
    ProgramRef::Builtin(program)
}

#[test]
fn same_state_rects_and_lines_share_one_command() {
    for aa in [0.0, 1.0] {
        let mut list = DrawList::default();
        list.set_aa_size(aa);
        for i in 0..5 {
            let x = i as f32 * 20.0;
            list.add_rect(&Rect::new(x, 0.0, 10.0, 10.0), Color::WHITE);
            list.add_line(Point::new(x, 20.0), Point::new(x + 10.0, 30.0), Color::WHITE, 2.0);
        }

        assert_eq!(list.commands().len(), 1, "aa {aa}");
        assert_eq!(list.commands_requested(), 10);
        let command = &list.commands()[0];
        assert_eq!(command.vertices_offset, 0);
        assert_eq!(command.vertices_count as usize, list.vertices().len());
        assert_eq!(command.indices_count as usize, list.indices().len());
    }
}

#[test]
fn alternating_clips_never_merge() {
    let a = Rect::new(0.0, 0.0, 50.0, 50.0);
    let b = Rect::new(50.0, 0.0, 50.0, 50.0);
    let alternations = 6;

    let mut list = DrawList::default();
    for i in 0..=alternations {
        list.push_clip(if i % 2 == 0 { &a } else { &b });
        list.add_rect(&Rect::new(10.0, 10.0, 10.0, 10.0), Color::WHITE);
        list.pop_clip();
    }

    assert_eq!(list.commands().len(), alternations + 1);
    assert!(list.validate_stacks().is_ok());
    for (i, command) in list.commands().iter().enumerate() {
        let expected = if i % 2 == 0 { a } else { b };
        assert_eq!(command.clip, Some(expected));
    }
}

#[test]
fn opaque_rect_without_fringe_needs_no_blending() {
    let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

    let mut list = DrawList::default();
    list.set_aa_size(0.0);
    list.add_rect(&rect, Color::WHITE);
    assert_eq!(list.commands()[0].blend, BlendMode::None);

    let mut list = DrawList::default();
    list.set_aa_size(0.0);
    list.add_rect(&rect, Color::WHITE.with_alpha(128));
    assert_eq!(list.commands()[0].blend, BlendMode::Normal);

    // the fringe fades to transparent
    let mut list = DrawList::default();
    list.set_aa_size(1.0);
    list.add_rect(&rect, Color::WHITE);
    assert_eq!(list.commands()[0].blend, BlendMode::Normal);
}

#[test]
fn pushed_blend_overrides_deduction() {
    let mut list = DrawList::default();
    list.set_aa_size(0.0);
    list.push_blend(BlendMode::Additive);
    list.add_rect(&Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
    list.pop_blend();
    list.add_rect(&Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);

    let blends: Vec<_> = list.commands().iter().map(|c| c.blend).collect();
    assert_eq!(blends, vec![BlendMode::Additive, BlendMode::None]);
}

#[test]
fn images_batch_per_texture() {
    let first = rgba_image(1);
    let second = rgba_image(2);
    let mut list = DrawList::default();
    list.add_image(&first, &Rect::new(0.0, 0.0, 64.0, 32.0), Color::WHITE);
    list.add_image(&first, &Rect::new(64.0, 0.0, 64.0, 32.0), Color::WHITE);
    list.add_image(&second, &Rect::new(0.0, 32.0, 64.0, 32.0), Color::WHITE);

    let commands = list.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].setup.program, builtin(BuiltinProgram::MultiChannel));
    assert_eq!(commands[0].blend, BlendMode::Normal);
    assert_eq!(commands[0].indices_count, 12);
    assert!(commands[1].setup.begin.contains(&DeferredOp::SetUniformTexture {
        name: lumen_gpu::draw_list::TEXTURE_UNIFORM,
        texture: TextureId(2),
        slot: 0,
    }));

    let uvs: Vec<[f32; 2]> = list.vertices()[..4].iter().map(|v| v.uv).collect();
    assert_eq!(uvs, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
}

#[test]
fn single_channel_images_pick_their_program() {
    let mask = lumen_core::ImageView::new(TextureId(5), 8, 8, TextureFormat::Alpha8);
    let mut list = DrawList::default();
    list.add_image(&mask, &Rect::new(0.0, 0.0, 8.0, 8.0), Color::RED);
    assert_eq!(
        list.commands()[0].setup.program,
        builtin(BuiltinProgram::SingleChannel)
    );
}

#[test]
fn crops_force_crop_program_and_blending() {
    let image = rgba_image(1);
    let mut list = DrawList::default();
    list.push_blend(BlendMode::None);
    list.push_crop(&Rect::new(0.0, 0.0, 32.0, 32.0));
    list.add_image(&image, &Rect::new(0.0, 0.0, 64.0, 64.0), Color::WHITE);
    list.pop_crop();
    list.add_image(&image, &Rect::new(0.0, 0.0, 64.0, 64.0), Color::WHITE);
    list.pop_blend();

    let commands = list.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].setup.program, builtin(BuiltinProgram::MultiChannelCrop));
    assert_eq!(commands[0].blend, BlendMode::Normal);
    assert!(commands[0].setup.begin.iter().any(|op| matches!(
        op,
        DeferredOp::SetUniformRects { name, rects } if *name == CROP_UNIFORM && rects.len() == 1
    )));
    assert_eq!(commands[1].setup.program, builtin(BuiltinProgram::MultiChannel));
    assert_eq!(commands[1].blend, BlendMode::None);
}

#[test]
fn different_crops_split_commands() {
    let image = rgba_image(1);
    let mut list = DrawList::default();
    for x in [0.0, 10.0] {
        list.push_crop(&Rect::new(x, 0.0, 5.0, 5.0));
        list.add_image(&image, &Rect::new(0.0, 0.0, 20.0, 20.0), Color::WHITE);
        list.pop_crop();
    }
    assert_eq!(list.commands().len(), 2);
}

#[test]
fn text_runs_with_one_atlas_merge() {
    let font = monospace();
    let mut hello = Text::new("hello", font.clone());
    let mut world = Text::new("world", font);

    let mut list = DrawList::default();
    list.add_text(&mut hello, Point::new(0.0, 0.0));
    list.add_text(&mut world, Point::new(0.0, 30.0));

    let commands = list.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(list.commands_requested(), 2);
    assert_eq!(commands[0].setup.program, builtin(BuiltinProgram::SingleChannel));
    assert_eq!(commands[0].indices_count, 10 * 6);
    assert!(commands[0].setup.begin.contains(&DeferredOp::SetUniformTexture {
        name: lumen_gpu::draw_list::TEXTURE_UNIFORM,
        texture: ATLAS,
        slot: 0,
    }));

    // second run placed 30 below the first
    let first_top = list.vertices()[0].pos[1];
    let second_top = list.vertices()[20].pos[1];
    assert_eq!(second_top - first_top, 30.0);
}

#[test]
fn large_distance_field_runs_defer_their_transform() {
    let config = DrawListConfig {
        sdf_cpu_transform_max_vertices: 8,
        ..Default::default()
    };
    let mut list = DrawList::new(config);
    let mut long = Text::new("abc", distance_field());
    let mut short = Text::new("a", distance_field());
    let local = long.geometry().vertices.clone();

    list.push_transform(&Affine2D::scale(2.0, 2.0));
    list.add_text(&mut long, Point::new(5.0, 5.0));
    list.add_text(&mut short, Point::new(5.0, 5.0));
    list.pop_transform();

    let commands = list.commands();
    assert_eq!(commands.len(), 2);

    let deferred = &commands[0];
    assert_eq!(deferred.setup.program, builtin(BuiltinProgram::DistanceField));
    let expected = Affine2D::scale(2.0, 2.0)
        .then(&Affine2D::translation(5.0, 5.0))
        .to_mat4();
    assert!(deferred
        .setup
        .begin
        .contains(&DeferredOp::PushTransform(expected)));
    assert_eq!(deferred.setup.end.as_slice(), &[DeferredOp::PopTransform]);
    assert_eq!(&list.vertices()[..12], local.as_slice());

    let transformed = &commands[1];
    assert!(transformed.setup.end.is_empty());
    let v = list.vertices()[12];
    let expected_x = (local[0].pos[0] + 5.0) * 2.0;
    assert!((v.pos[0] - expected_x).abs() < 1e-4);
    assert!(transformed.setup.begin.iter().any(|op| matches!(
        op,
        DeferredOp::SetUniformTexture { texture, .. } if *texture == SDF_ATLAS
    )));
}

#[test]
fn distance_field_outlines_become_uniforms() {
    let mut list = DrawList::default();
    let mut plain = Text::new("abc", distance_field());
    let mut outlined = Text::new("abc", distance_field());
    outlined.set_outline(Outline::new(Color::RED, 2.0));
    list.add_text(&mut plain, Point::ZERO);
    list.add_text(&mut outlined, Point::ZERO);

    // no offset copies: both runs emit one quad per glyph
    assert_eq!(list.vertices().len(), 24);
    let commands = list.commands();
    assert_eq!(commands.len(), 2);
    assert_ne!(commands[0].hash, commands[1].hash);

    let is_outline_op = |op: &DeferredOp| {
        matches!(
            op,
            DeferredOp::SetUniformColor { name, .. } | DeferredOp::SetUniformFloat { name, .. }
                if *name == OUTLINE_COLOR_UNIFORM || *name == OUTLINE_WIDTH_UNIFORM
        )
    };
    assert!(!commands[0].setup.begin.iter().any(is_outline_op));
    assert!(commands[1].setup.begin.contains(&DeferredOp::SetUniformColor {
        name: OUTLINE_COLOR_UNIFORM,
        color: Color::RED,
    }));
    assert!(commands[1].setup.begin.contains(&DeferredOp::SetUniformFloat {
        name: OUTLINE_WIDTH_UNIFORM,
        value: 2.0,
    }));
}

#[test]
fn bitmap_outlines_stay_in_the_geometry() {
    let mut list = DrawList::default();
    let mut outlined = Text::new("ab", monospace());
    outlined.set_outline(Outline::new(Color::RED, 1.0));
    list.add_text(&mut outlined, Point::ZERO);

    // 8 outline copies plus the glyphs themselves
    assert_eq!(list.vertices().len(), 2 * 4 * 9);
    assert_eq!(list.commands().len(), 1);
    assert!(!list.commands()[0]
        .setup
        .begin
        .iter()
        .any(|op| matches!(op, DeferredOp::SetUniformColor { .. })));
}

#[test]
fn appended_lists_keep_their_commands() {
    let mut parent = DrawList::default();
    parent.add_rect(&Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
    parent.add_rect(&Rect::new(20.0, 0.0, 10.0, 10.0), Color::WHITE);

    let mut child = DrawList::default();
    for i in 0..3 {
        child.add_rect(&Rect::new(i as f32 * 20.0, 20.0, 10.0, 10.0), Color::WHITE);
    }

    let vertex_base = parent.vertices().len() as u32;
    let index_base = parent.indices().len() as u32;
    parent.add_list(&child);

    let commands = parent.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].hash, commands[1].hash);
    assert_eq!(parent.commands_requested(), 5);
    assert_eq!(commands[1].vertices_offset, vertex_base);
    assert_eq!(commands[1].indices_offset, index_base);
    assert_eq!(
        parent.indices()[index_base as usize],
        child.indices()[0] + vertex_base
    );
    assert_eq!(
        parent.vertices().len(),
        vertex_base as usize + child.vertices().len()
    );
}

#[test]
fn raw_vertices_are_indexed_automatically() {
    let v = |x: f32, y: f32| Vertex::colored(Point::new(x, y), Color::WHITE);
    let quads: Vec<Vertex> = (0..8).map(|i| v(i as f32, 0.0)).collect();
    let strip: Vec<Vertex> = (0..5).map(|i| v(i as f32, 1.0)).collect();

    let mut list = DrawList::default();
    list.add_vertices(PrimitiveType::Triangles, DrawMode::Indexed, &quads, None);
    assert_eq!(list.indices().len(), 12);
    assert_eq!(&list.indices()[6..12], &[4, 5, 6, 4, 6, 7]);

    list.add_vertices(PrimitiveType::Lines, DrawMode::Indexed, &strip, None);
    assert_eq!(list.indices().len(), 12 + 8);
    assert_eq!(&list.indices()[12..14], &[8, 9]);
    assert_eq!(list.commands()[1].primitive, PrimitiveType::Lines);

    // a fifth vertex does not make a quad
    list.add_vertices(PrimitiveType::Triangles, DrawMode::Indexed, &quads[..5], None);
    assert_eq!(list.vertices().len(), 8 + 5 + 4);
}

#[test]
fn array_fans_are_never_merged() {
    let fan: Vec<Vertex> = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
        .iter()
        .map(|&(x, y)| Vertex::colored(Point::new(x, y), Color::WHITE))
        .collect();

    let mut list = DrawList::default();
    list.add_vertices(PrimitiveType::TriangleFan, DrawMode::Array, &fan, None);
    list.add_vertices(PrimitiveType::TriangleFan, DrawMode::Array, &fan, None);

    let commands = list.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands.iter().all(|c| c.hash == 0 && c.indices_count == 0));
    assert_eq!(commands[1].vertices_offset, 4);
    assert!(list.indices().is_empty());
}

#[test]
fn explicit_program_applies_and_may_opt_out_of_batching() {
    let mut list = DrawList::default();
    list.push_program(ProgramSetup::new(ProgramRef::Custom(3)).with_uniforms_hash(42));
    list.add_rect(&Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
    list.add_rect(&Rect::new(2.0, 0.0, 1.0, 1.0), Color::WHITE);
    list.pop_program();
    assert_eq!(list.commands().len(), 1);
    assert_eq!(list.commands()[0].setup.program, ProgramRef::Custom(3));

    let opaque_ops = ProgramSetup::new(ProgramRef::Custom(4)).with_begin(DeferredOp::SetUniformInt {
        name: "u_mode",
        value: 2,
    });
    list.push_program(opaque_ops);
    list.add_rect(&Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
    list.add_rect(&Rect::new(2.0, 0.0, 1.0, 1.0), Color::WHITE);
    list.pop_program();
    assert_eq!(list.commands().len(), 3);
    assert_eq!(list.commands()[2].hash, 0);
}

#[test]
fn rich_text_embeds_share_the_atlas_command() {
    let mut rich = RichText::new(monospace()).with_markup("x^{y} z");
    let mut list = DrawList::default();
    list.add_rich_text(&mut rich, Point::new(10.0, 10.0));

    // main text and superscript both sample the atlas
    assert_eq!(list.commands_requested(), 2);
    assert_eq!(list.commands().len(), 1);
    assert_eq!(list.indices().len(), 3 * 6);
    assert_eq!(
        list.commands()[0].setup.program,
        builtin(BuiltinProgram::SingleChannel)
    );
}

#[test]
fn shapes_cover_their_outline() {
    let mut list = DrawList::default();
    list.set_aa_size(0.0);
    list.add_rounded_rect(
        &Rect::new(0.0, 0.0, 40.0, 20.0),
        5.0,
        CornerFlags::TOP,
        Gradient::new(Color::RED, Color::BLUE),
    );
    list.add_ellipse_filled(Point::new(50.0, 50.0), Point::new(10.0, 5.0), Gradient::solid(Color::WHITE), 16);
    list.add_ellipse(Point::new(50.0, 50.0), Point::new(10.0, 5.0), Color::WHITE, 1.0, 0);
    list.add_rect_outline(&Rect::new(0.0, 0.0, 40.0, 20.0), Color::WHITE, 2.0, 4.0);
    list.add_bezier_curve(
        Point::new(0.0, 0.0),
        Point::new(30.0, -30.0),
        Point::new(60.0, 30.0),
        Point::new(90.0, 0.0),
        Color::WHITE,
        1.5,
        0,
    );
    let mut zigzag = Polyline::new();
    zigzag.path(
        &[Point::new(0.0, 0.0), Point::new(20.0, 20.0), Point::new(40.0, 0.0)],
        4.0,
    );
    list.add_polyline(&zigzag, Color::WHITE, 3.0);

    assert_eq!(list.commands_requested(), 6);
    // opaque and without a fringe, so everything shares one unblended command
    assert_eq!(list.commands().len(), 1);
    assert_eq!(list.commands()[0].blend, BlendMode::None);
    let max = list.indices().iter().copied().max().unwrap();
    assert!((max as usize) < list.vertices().len());
}

#[test]
fn rounded_images_keep_uvs_inside_the_view() {
    let image = rgba_image(9).sub_view(Rect::new(0.0, 0.0, 32.0, 16.0));
    let mut list = DrawList::default();
    list.add_image_rounded(
        &image,
        &Rect::new(0.0, 0.0, 100.0, 50.0),
        10.0,
        CornerFlags::ALL,
        Color::WHITE,
    );
    assert_eq!(list.commands().len(), 1);
    for v in list.vertices() {
        assert!((0.0..=0.5).contains(&v.uv[0]), "{:?}", v.uv);
        assert!((0.0..=0.5).contains(&v.uv[1]), "{:?}", v.uv);
    }
}
