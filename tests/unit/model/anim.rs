use super::*;

fn layer_with_mask(mask: u32) -> Layer {
    Layer {
        mask,
        visible: true,
        ..Layer::default()
    }
}

#[test]
fn mask_zero_is_never_suppressed() {
    let layer = layer_with_mask(0);
    assert!(!layer.is_suppressed_variant(0));
    assert!(!layer.is_suppressed_variant(0b0010));
}

#[test]
fn variant_is_drawn_only_when_mask_bits_overlap() {
    let layer = layer_with_mask(0b0010);
    assert!(!layer.is_suppressed_variant(0b0010));
    assert!(layer.is_suppressed_variant(0b0001));
    assert!(!layer.is_suppressed_variant(0b0011));
}

#[test]
fn names_match_case_insensitively() {
    let layer = Layer {
        name: "Mouth_A".to_string(),
        ..Layer::default()
    };
    assert!(layer.name_matches("mouth_a"));
    assert!(layer.name_matches("MOUTH_A"));
    assert!(!layer.name_matches("mouth_b"));
}

#[test]
fn rect_reflects_placement_and_size() {
    let layer = Layer {
        x: -3,
        y: 4,
        w: 10,
        h: 2,
        ..Layer::default()
    };
    assert_eq!(layer.rect(), Rect::new(-3, 4, 10, 2));
    assert!(layer.bitmap().is_none());
}
