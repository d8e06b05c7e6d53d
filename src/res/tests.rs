use super::*;
use crate::imgc::PixelFormat;
use crate::util::{hash_name, ContentHash, Error, ErrorKind};

fn sample() -> (ResourceTable, StringTable) {
    let textures = [
        TextureDesc::new("body_diffuse", PixelFormat::Etc1A4, 64, 32),
        TextureDesc::new("body_normal", PixelFormat::Rgb565, 32, 32),
    ];
    let materials = [MaterialDesc::new("body", ["body_diffuse", "body_normal"])];
    build(["pelvis", "spine"], &textures, &materials, ["walk"]).unwrap()
}

#[test]
fn test_resolve_after_roundtrip() {
    let (table, _) = sample();
    let bytes = table.encode().unwrap();
    let decoded = ResourceTable::decode(&bytes).unwrap();
    assert_eq!(decoded, table);

    assert_eq!(decoded.bone_name(hash_name("pelvis")), Some("pelvis"));
    assert_eq!(decoded.resolve_bone(hash_name("spine")).unwrap(), "spine");
    assert_eq!(decoded.animation_name(hash_name("walk")), Some("walk"));

    let tex = decoded.texture(hash_name("body_diffuse")).unwrap();
    assert_eq!(tex.format().unwrap(), PixelFormat::Etc1A4);
    assert!(tex.has_alpha);
    assert_eq!((tex.width, tex.height), (64, 32));

    let mat = decoded.material(hash_name("body")).unwrap();
    assert_eq!(
        mat.textures.as_slice(),
        [hash_name("body_diffuse"), hash_name("body_normal")]
    );
}

#[test]
fn test_string_table_dedup() {
    // "body" is both a material and a bone name
    let materials = [MaterialDesc::new("body", Vec::<String>::new())];
    let (table, strings) = build(["body", "spine"], &[], &materials, ["body"]).unwrap();
    assert_eq!(strings.strings(), ["body", "spine"]);
    assert_eq!(strings.as_bytes(), b"body\0spine\0");
    assert_eq!(table.string_table().unwrap(), strings);
}

#[test]
fn test_empty_sections_omitted() {
    let (table, _) = build(["root"], &[], &[], Vec::<&str>::new()).unwrap();
    let bytes = table.encode().unwrap();
    // One bone section only
    assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 1);
    assert_eq!(&bytes[..8], ResourceKind::Character.magic());
    let decoded = ResourceTable::decode(&bytes).unwrap();
    assert_eq!(decoded.bones().len(), 1);
    assert!(decoded.textures().is_empty());
}

#[test]
fn test_scene_kind() {
    let mut builder = ResourceTableBuilder::new(ResourceKind::Scene);
    builder.add_bone("prop_root").unwrap();
    let (table, _) = builder.build();
    let decoded = ResourceTable::decode(&table.encode().unwrap()).unwrap();
    assert_eq!(decoded.kind(), ResourceKind::Scene);
}

#[test]
fn test_bad_magic() {
    let (table, _) = sample();
    let mut bytes = table.encode().unwrap();
    bytes[0] = b'X';
    assert!(matches!(
        ResourceTable::decode(&bytes),
        Err(Error::InvalidMagic { format: "RES", .. })
    ));
    assert!(ResourceTable::decode(b"CHR").unwrap_err().is_format_error());
}

#[test]
fn test_unknown_section_tag() {
    let (table, _) = sample();
    let mut bytes = table.encode().unwrap();
    bytes[HEADER_SIZE] = 0x99;
    let err = ResourceTable::decode(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_record_size_mismatch() {
    let (table, _) = sample();
    let mut bytes = table.encode().unwrap();
    bytes[HEADER_SIZE + 2] = 12;
    assert!(ResourceTable::decode(&bytes).unwrap_err().is_format_error());
}

#[test]
fn test_truncated_section() {
    let (table, _) = sample();
    let mut bytes = table.encode().unwrap();
    // Claim far more bone records than fit before the string table
    bytes[HEADER_SIZE + 4..HEADER_SIZE + 8].copy_from_slice(&1000u32.to_le_bytes());
    assert!(matches!(
        ResourceTable::decode(&bytes),
        Err(Error::UnexpectedEof { .. })
    ));
}

#[test]
fn test_string_offset_out_of_range() {
    let (table, _) = sample();
    let mut bytes = table.encode().unwrap();
    // Name offset of the first bone record
    let at = HEADER_SIZE + SECTION_HEADER_SIZE + 4;
    bytes[at..at + 4].copy_from_slice(&0xFFFFu32.to_le_bytes());
    assert!(ResourceTable::decode(&bytes).unwrap_err().is_format_error());
}

#[test]
fn test_too_many_material_textures() {
    let materials = [MaterialDesc::new("m", ["a", "b", "c", "d", "e"])];
    assert!(build(Vec::<&str>::new(), &[], &materials, Vec::<&str>::new()).is_err());
}

#[test]
fn test_collision_keeps_first() {
    let mut table = ResourceTable::new(ResourceKind::Character);
    let hash = ContentHash(0x1234_5678);
    table.push_bone(BoneEntry {
        hash,
        name: "first".into(),
    });
    table.push_bone(BoneEntry {
        hash,
        name: "second".into(),
    });
    assert_eq!(table.bone_name(hash), Some("first"));
    assert_eq!(table.bones().len(), 2);

    let decoded = ResourceTable::decode(&table.encode().unwrap()).unwrap();
    assert_eq!(decoded.bones().len(), 2);
    assert_eq!(decoded.bone_name(hash), Some("first"));
}

#[test]
fn test_missing_bone() {
    let (table, _) = sample();
    let missing = hash_name("tail");
    let err = table.resolve_bone(missing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
    assert_eq!(table.bone_name_or_placeholder(missing, 7), "bone_7");
    assert_eq!(table.bone_name_or_placeholder(hash_name("spine"), 1), "spine");
}

#[test]
fn test_names_outside_code_page_rejected() {
    let err = build(["\u{9aa8}"], &[], &[], Vec::<&str>::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let (table, _) = build(["caf\u{e9}"], &[], &[], Vec::<&str>::new()).unwrap();
    let decoded = ResourceTable::decode(&table.encode().unwrap()).unwrap();
    assert_eq!(decoded.bone_name(hash_name("caf\u{e9}")), Some("caf\u{e9}"));
}

#[test]
fn test_empty_names_rejected() {
    let mut builder = ResourceTableBuilder::new(ResourceKind::Character);
    assert!(builder.add_bone("").is_err());
    assert!(builder.add_animation("").is_err());
    assert!(builder
        .add_texture(&TextureDesc::new("", PixelFormat::L8, 4, 4))
        .is_err());
    assert!(builder.add_material(&MaterialDesc::new("", ["a"])).is_err());
    assert!(builder.add_material(&MaterialDesc::new("m", [""])).is_err());
    let (table, strings) = builder.build();
    assert!(table.bones().is_empty());
    assert!(strings.is_empty());
}

#[test]
fn test_encode_with_built_strings() {
    let (table, strings) = sample();
    assert_eq!(table.encode_with(&strings).unwrap(), table.encode().unwrap());

    // Every record name has to be in the string table handed in
    let (other, other_strings) = build(["root"], &[], &[], Vec::<&str>::new()).unwrap();
    assert!(table.encode_with(&other_strings).unwrap_err().is_format_error());
    assert!(other.encode_with(&StringTable::default()).is_err());
}
