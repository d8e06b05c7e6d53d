use super::*;
use crate::util::{hash_name, ErrorKind, Quat, Vec3};

fn walk_clip() -> AnimationClip {
    let mut clip = AnimationClip::new("walk", 5);
    let pelvis = clip.add_bone(hash_name("pelvis"));
    let spine = clip.add_bone(hash_name("spine"));

    let mut track = BoneTrack::new(pelvis);
    track.location = vec![
        Key::linear(0, Vec3::ZERO),
        Key::new(2, Vec3::new(2.0, 0.0, 0.0), Interpolation::Constant),
        Key::new(4, Vec3::new(4.0, 0.0, 0.0), Interpolation::Bezier),
    ];
    track.rotation = vec![Key::linear(0, Quat::IDENTITY), Key::linear(4, Quat::from_rotation_z(1.0))];
    clip.tracks.push(track);

    let mut track = BoneTrack::new(spine);
    track.scale = vec![Key::new(1, Vec3::splat(2.0), Interpolation::Elastic)];
    clip.tracks.push(track);
    clip
}

#[test]
fn test_mtn3_roundtrip() {
    let clip = walk_clip();
    let bytes = encode_mtn3(&clip).unwrap();
    assert_eq!(&bytes[..4], b"MTN3");
    assert_eq!(decode_mtn3(&bytes).unwrap(), clip);

    let motion = Motion::decode(&bytes).unwrap();
    assert_eq!(motion.generation(), Generation::Mtn3);
    assert_eq!(motion.encode().unwrap(), bytes);
}

#[test]
fn test_header_layout() {
    let clip = walk_clip();
    let bytes = encode_mtn3(&clip).unwrap();
    let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    assert_eq!(u32_at(4), hash_name("walk").0);
    assert_eq!(u32_at(8), 5);
    assert_eq!(u32_at(12), 2);
    assert_eq!(u32_at(16), 2);
    assert_eq!(u32_at(20), 4);
    assert_eq!(&bytes[24..28], b"walk");
    assert_eq!(u32_at(28), hash_name("pelvis").0);
    assert_eq!(u32_at(32), hash_name("spine").0);
}

#[test]
fn test_mtn2_bakes_every_frame() {
    let clip = walk_clip();
    let bytes = encode_mtn2(&clip).unwrap();
    let dense = decode_mtn2(&bytes).unwrap();

    assert_eq!(dense.bones, clip.bones);
    assert_eq!(dense.tracks.len(), 2);
    for track in &dense.tracks {
        assert_eq!(track.location.len(), 5);
        assert!(track.location.iter().all(|k| k.interpolation == Interpolation::Linear));
    }

    let pelvis = &dense.tracks[0].location;
    assert_eq!(pelvis[1].value, Vec3::new(1.0, 0.0, 0.0));
    // Constant key at frame 2 holds until frame 4
    assert_eq!(pelvis[3].value, Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(pelvis[4].value, Vec3::new(4.0, 0.0, 0.0));

    // Untracked channels bake to identity, single keys hold everywhere
    let spine = &dense.tracks[1];
    assert_eq!(spine.location[3].value, Vec3::ZERO);
    assert_eq!(spine.rotation[0].value, Quat::IDENTITY);
    assert_eq!(spine.scale[0].value, Vec3::splat(2.0));

    // Dense clips re-encode to the same bytes
    assert_eq!(encode_mtn2(&dense).unwrap(), bytes);
}

#[test]
fn test_mtn2_track_count_mismatch() {
    let clip = walk_clip();
    let mut bytes = encode_mtn2(&clip).unwrap();
    bytes[16] = 1;
    assert!(decode_mtn2(&bytes).unwrap_err().is_format_error());
}

#[test]
fn test_name_hash_mismatch() {
    let clip = walk_clip();
    let mut bytes = encode_mtn3(&clip).unwrap();
    bytes[24] = b'W';
    assert!(decode_mtn3(&bytes).unwrap_err().is_format_error());
}

#[test]
fn test_bone_index_out_of_range() {
    let mut clip = walk_clip();
    clip.tracks[1].bone = 2;
    assert!(encode_mtn3(&clip).is_err());

    let bytes = encode_mtn3(&walk_clip()).unwrap();
    let mut bad = bytes.clone();
    // First track's bone index follows the header and both bone hashes
    bad[36] = 9;
    assert!(decode_mtn3(&bad).unwrap_err().is_format_error());
}

#[test]
fn test_key_outside_frame_range() {
    let mut clip = walk_clip();
    clip.tracks[0].location.push(Key::linear(5, Vec3::ONE));
    assert!(encode_mtn3(&clip).unwrap_err().is_format_error());
}

#[test]
fn test_duplicate_bone_hash() {
    let mut clip = walk_clip();
    clip.bones[1] = clip.bones[0];
    assert!(encode_mtn2(&clip).is_err());
}

#[test]
fn test_unknown_interpolation() {
    let bytes = encode_mtn3(&walk_clip()).unwrap();
    let mut bad = bytes.clone();
    // Track 0: bone index at 36, location count at 40, first key frame at 44
    bad[48] = 42;
    assert_eq!(decode_mtn3(&bad).unwrap_err().kind(), ErrorKind::Unsupported);
}

#[test]
fn test_truncated() {
    let bytes = encode_mtn3(&walk_clip()).unwrap();
    assert!(matches!(
        decode_mtn3(&bytes[..bytes.len() - 2]),
        Err(Error::UnexpectedEof { .. })
    ));
    assert!(matches!(
        Motion::decode(b"MTN9"),
        Err(Error::InvalidMagic { format: "XMTN", .. })
    ));
}

#[test]
fn test_clip_name_outside_code_page() {
    let mut clip = walk_clip();
    clip.name = "\u{6b69}\u{304f}".into();
    assert_eq!(encode_mtn3(&clip).unwrap_err().kind(), ErrorKind::Format);
    assert_eq!(encode_mtn2(&clip).unwrap_err().kind(), ErrorKind::Format);
}
