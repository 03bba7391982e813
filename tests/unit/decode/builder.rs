use super::*;
use crate::foundation::config::RuntimeConfig;

fn arena(layers: u32, frames: u32) -> ObjectArena {
    ObjectArena::new(&RuntimeConfig {
        max_layers: layers,
        max_frames: frames,
        max_animations: 1,
    })
}

#[test]
fn frames_and_layers_link_in_order() {
    let mut arena = arena(8, 4);
    let built = {
        let mut b = AnimBuilder::new(&mut arena);
        b.push_frame().unwrap();
        b.push_layer().unwrap();
        b.push_layer().unwrap();
        assert_eq!(b.current_frame_layers(), 2);
        b.push_frame().unwrap();
        assert_eq!(b.current_frame_layers(), 0);
        b.push_layer().unwrap();
        b.finish()
    };
    assert_eq!(built.frames_count, 2);

    let first = built.first_frame.unwrap();
    let frame0 = arena.frame(first).unwrap();
    assert_eq!(frame0.layers_count, 2);
    assert_eq!(arena.frame_layers(first).count(), 2);
    let second = frame0.next_frame.unwrap();
    assert_eq!(arena.frame_layers(second).count(), 1);
}

#[test]
fn layer_before_frame_is_malformed() {
    let mut arena = arena(2, 2);
    let mut b = AnimBuilder::new(&mut arena);
    let err = b.push_layer().unwrap_err();
    assert!(matches!(err, SpriteError::MalformedContainer(_)));
    assert!(b.current_layer("tEXt").is_err());
}

#[test]
fn dropping_unfinished_builder_releases_everything() {
    let mut arena = arena(4, 4);
    {
        let mut b = AnimBuilder::new(&mut arena);
        b.push_frame().unwrap();
        b.push_layer().unwrap();
        b.push_frame().unwrap();
        b.push_layer().unwrap();
    }
    assert!(arena.stats().is_idle());
}

#[test]
fn exhaustion_surfaces_as_pool_error() {
    let mut arena = arena(1, 1);
    let mut b = AnimBuilder::new(&mut arena);
    b.push_frame().unwrap();
    b.push_layer().unwrap();
    assert!(matches!(
        b.push_layer().unwrap_err(),
        SpriteError::PoolExhausted {
            pool: PoolKind::Layer
        }
    ));
    assert!(matches!(
        b.push_frame().unwrap_err(),
        SpriteError::PoolExhausted {
            pool: PoolKind::Frame
        }
    ));
}
