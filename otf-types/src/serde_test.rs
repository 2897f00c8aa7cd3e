//! ensure serde is working as expected

use super::*;

#[test]
fn test_serde() {
    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct MyTypes {
        f1: Fixed,
        f2: F2Dot14,
        gid: GlyphId,
        offset: Offset16,
        tag: Tag,
        u24: Uint24,
    }

    let my_instance = MyTypes {
        f1: Fixed::from_f64(521.5),
        f2: F2Dot14::from_f64(1.2),
        gid: GlyphId::new(69),
        offset: Offset16::new(42),
        tag: Tag::new(b"cool"),
        u24: Uint24::new(16_777_215),
    };

    let dumped = serde_json::to_string(&my_instance).unwrap();
    let loaded: MyTypes = serde_json::from_str(&dumped).unwrap();
    assert_eq!(my_instance, loaded)
}
