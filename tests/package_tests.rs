//! Integration tests for packing archives and loading them back.

use level5::imgc;
use level5::prelude::*;
use level5::res::{self, MaterialDesc};
use level5::util::{ReferenceKind, Quat, Vec3};

use tempfile::NamedTempFile;

fn bone_blob(name: &str, parent: Option<&str>) -> Vec<u8> {
    BoneRecord::from_named(name, parent, Transform::IDENTITY).encode()
}

fn walk_clip(frame_count: u32) -> AnimationClip {
    let mut clip = AnimationClip::new("walk", frame_count);
    let pelvis = clip.add_bone(hash_name("pelvis"));
    let spine = clip.add_bone(hash_name("spine"));

    let mut track = BoneTrack::new(pelvis);
    track.location.push(Key::linear(0, Vec3::ZERO));
    track.location.push(Key::linear(frame_count - 1, Vec3::new(0.0, 0.0, 4.0)));
    clip.tracks.push(track);

    let mut track = BoneTrack::new(spine);
    track.rotation.push(Key::new(0, Quat::IDENTITY, Interpolation::Constant));
    track.rotation.push(Key::linear(10, Quat::from_rotation_y(0.5)));
    clip.tracks.push(track);
    clip
}

fn character_source() -> PackageSource {
    let mut checker = Vec::new();
    for i in 0..16 {
        checker.push(if i % 2 == 0 { Rgba::WHITE } else { Rgba::new(0, 0, 0, 255) });
    }
    PackageSource {
        bones: vec![
            BoneSource::new("pelvis", None, Transform::IDENTITY),
            BoneSource::new(
                "spine",
                Some("pelvis"),
                Transform::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE),
            ),
        ],
        textures: vec![
            TextureSource {
                name: "body_diffuse".into(),
                image: Image::new(4, 4, checker).expect("image"),
                format: Some(PixelFormat::Rgba8),
            },
            TextureSource {
                name: "body_mask".into(),
                image: Image::filled(4, 4, Rgba::gray(136)),
                format: Some(PixelFormat::L4),
            },
        ],
        materials: vec![MaterialDesc::new("body", ["body_diffuse", "body_mask"])],
        animation: Some(walk_clip(250)),
        splits: vec![SplitSource {
            name: "walk_loop".into(),
            frame_start: 10,
            frame_end: 50,
        }],
        meshes: Vec::new(),
    }
}

#[test]
fn test_parent_resolves_through_table() {
    let (table, _) = res::build(["pelvis", "spine"], &[], &[], Vec::<&str>::new()).expect("table");

    let mut archive = Archive::new();
    archive.push("000.mbn", bone_blob("pelvis", None)).unwrap();
    archive.push("001.mbn", bone_blob("spine", Some("pelvis"))).unwrap();
    archive.push("RES.bin", table.encode().unwrap()).unwrap();

    let bytes = archive.to_bytes().unwrap();
    let archive = Archive::from_bytes(&bytes).unwrap();
    let package = load_package(&archive, &LoadOptions::default()).unwrap();

    let spine = package.bone_index("spine").expect("spine loaded");
    assert_eq!(package.parent_name(spine), Some("pelvis"));
    assert_eq!(package.parent_name(package.bone_index("pelvis").unwrap()), None);
    assert!(package.warnings.is_empty(), "warnings: {:?}", package.warnings);
}

#[test]
fn test_l4_texture_blob() {
    let image = Image::new(2, 2, [0u8, 15, 8, 4].iter().map(|&l| Rgba::gray(l * 17)).collect()).unwrap();
    let blob = imgc::encode(&image, PixelFormat::L4).unwrap();
    assert_eq!(blob.len(), imgc::HEADER_SIZE + 2);

    let decoded = match route_entry("000.xi", &blob).unwrap() {
        Entry::Texture(texture) => texture,
        other => panic!("expected a texture, got {:?}", other.kind()),
    };
    assert_eq!(decoded.format, PixelFormat::L4);
    let levels: Vec<u8> = decoded.image.pixels().iter().map(|p| p.r / 17).collect();
    assert_eq!(levels, [0, 15, 8, 4]);
}

#[test]
fn test_package_file_roundtrip() {
    let source = character_source();
    let archive = build_archive(&source, &PackOptions::default()).unwrap();

    let names: Vec<&str> = archive.names().collect();
    assert_eq!(
        names,
        ["000.mbn", "001.mbn", "000.xi", "001.xi", "000.mtn3", "000.mtninf", "RES.bin"]
    );

    let temp = NamedTempFile::new().expect("Failed to create temp file");
    write_archive(temp.path(), &archive).unwrap();
    let reopened = open_archive(temp.path()).unwrap();
    assert_eq!(reopened, archive);
    // Without the memory map too
    assert_eq!(open_archive_opts(temp.path(), false).unwrap(), archive);

    let package = load_package(&reopened, &LoadOptions::default()).unwrap();
    assert!(package.warnings.is_empty(), "warnings: {:?}", package.warnings);
    assert_eq!(package.bone_names, ["pelvis", "spine"]);
    assert_eq!(package.parent_name(1), Some("pelvis"));

    let textures: Vec<&str> = package.textures.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(textures, ["body_diffuse", "body_mask"]);
    assert_eq!(package.textures[0].texture.image, source.textures[0].image);
    assert_eq!(package.textures[1].texture.image, source.textures[1].image);

    assert_eq!(package.materials.len(), 1);
    assert_eq!(package.materials[0].textures, ["body_diffuse", "body_mask"]);

    let motion = &package.animations[0];
    assert_eq!(motion.motion.generation(), Generation::Mtn3);
    assert_eq!(motion.motion.clip(), source.animation.as_ref().unwrap());
    assert_eq!(motion.bone_names, ["pelvis", "spine"]);

    let split = &package.splits[0];
    assert_eq!(split.parent_name.as_deref(), Some("walk"));
    assert_eq!((split.info.frame_start, split.info.frame_end), (10, 50));
    assert_eq!(split.info.duration(), 41);
}

#[test]
fn test_pack_is_deterministic() {
    let source = character_source();
    let first = build_and_pack(&source, &PackOptions::default()).unwrap();
    let second = build_and_pack(&source, &PackOptions::default()).unwrap();
    assert_eq!(first, second);

    let archive = Archive::from_bytes(&first).unwrap();
    assert_eq!(archive.to_bytes().unwrap(), first);
}

#[test]
fn test_batched_splits_and_mtn2() {
    let mut source = character_source();
    source.splits.push(SplitSource {
        name: "walk_stop".into(),
        frame_start: 200,
        frame_end: 249,
    });
    let options = PackOptions {
        generation: Generation::Mtn2,
        split_framing: SplitFraming::Batch,
        ..PackOptions::default()
    };
    let archive = build_archive(&source, &options).unwrap();
    assert!(archive.contains("000.mtn2"));
    assert!(archive.contains("000.mtninf2"));
    assert!(!archive.contains("000.mtninf"));

    let package = load_package(&archive, &LoadOptions::default()).unwrap();
    let splits: Vec<(&str, u32)> = package
        .splits
        .iter()
        .map(|s| (s.info.name.as_str(), s.info.duration()))
        .collect();
    assert_eq!(splits, [("walk_loop", 41), ("walk_stop", 50)]);
    assert!(package.splits.iter().all(|s| s.parent_name.as_deref() == Some("walk")));

    // Every frame is baked, so sampling matches the keyed source
    let baked = package.animations[0].motion.clip();
    let keyed = source.animation.as_ref().unwrap();
    let pelvis = hash_name("pelvis");
    let at = |clip: &AnimationClip, frame| clip.track_for(pelvis).unwrap().sample(frame).translation;
    assert!(at(baked, 0).abs_diff_eq(at(keyed, 0), 1e-5));
    assert!(at(baked, 249).abs_diff_eq(at(keyed, 249), 1e-5));
}

#[test]
fn test_unresolved_references_become_placeholders() {
    let mut source = character_source();
    // A bone whose parent is not in the archive, and a clip bone with no record
    source.bones.push(BoneSource::new("tail", Some("hips"), Transform::IDENTITY));
    if let Some(clip) = source.animation.as_mut() {
        clip.add_bone(hash_name("ghost"));
    }
    let mut archive = build_archive(&source, &PackOptions::default()).unwrap();

    // Drop "spine" from the table so its record falls back to a placeholder
    let mut builder = ResourceTableBuilder::new(ResourceKind::Character);
    builder.add_bone("pelvis").unwrap().add_bone("tail").unwrap();
    let (table, _) = builder.build();
    let entries: Vec<ArchiveEntry> = archive
        .iter()
        .filter(|e| e.name != "RES.bin")
        .cloned()
        .chain([ArchiveEntry::new("RES.bin", table.encode().unwrap())])
        .collect();
    archive = Archive::from_entries(entries).unwrap();

    let package = load_package(&archive, &LoadOptions::default()).unwrap();
    assert_eq!(package.bone_names, ["pelvis", "bone_1", "tail"]);
    assert_eq!(package.animations[0].bone_names, ["pelvis", "bone_1", "bone_2"]);
    // "tail" keeps its data and becomes a root
    assert_eq!(package.parent_name(2), None);
    assert_eq!(package.skeleton.unresolved_parents(), [2]);

    let kinds: Vec<(ReferenceKind, Option<&str>)> = package
        .warnings
        .iter()
        .map(|w| (w.kind, w.substitute.as_deref()))
        .collect();
    assert!(kinds.contains(&(ReferenceKind::Bone, Some("bone_1"))));
    assert!(kinds.contains(&(ReferenceKind::Bone, Some("bone_2"))));
    assert!(kinds.contains(&(ReferenceKind::Bone, None)));
    // Materials and splits were dropped from the replacement table
    assert!(package.materials.is_empty());
    assert_eq!(package.splits[0].parent_name.as_deref(), Some("walk"));

    let err = load_package(&archive, &LoadOptions::strict()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
}

#[test]
fn test_parallel_matches_sequential() {
    let archive = build_archive(&character_source(), &PackOptions::default()).unwrap();
    let parallel = load_package(&archive, &LoadOptions::default()).unwrap();
    let sequential = load_package(&archive, &LoadOptions::sequential()).unwrap();

    assert_eq!(parallel.resources, sequential.resources);
    assert_eq!(parallel.bone_names, sequential.bone_names);
    assert_eq!(parallel.materials, sequential.materials);
    assert_eq!(parallel.splits, sequential.splits);
    assert_eq!(parallel.warnings, sequential.warnings);
    let entries = |p: &Package| p.textures.iter().map(|t| t.entry.clone()).collect::<Vec<_>>();
    assert_eq!(entries(&parallel), entries(&sequential));
}

#[test]
fn test_meshes_and_unknown_entries_pass_through() {
    let mut source = character_source();
    source.meshes.push(ArchiveEntry::new("body.prm", vec![1, 2, 3, 4, 5]));
    let mut archive = build_archive(&source, &PackOptions::default()).unwrap();
    archive.push("notes.txt", b"hello".to_vec()).unwrap();

    assert_eq!(archive.names().next(), Some("body.prm"));
    let package = load_package(&archive, &LoadOptions::default()).unwrap();
    assert_eq!(package.meshes.len(), 1);
    assert_eq!(package.meshes[0].data, [1, 2, 3, 4, 5]);
    assert_eq!(package.unrecognized.len(), 1);
    assert_eq!(package.unrecognized[0].name, "notes.txt");
}

#[test]
fn test_load_errors() {
    // Two resource tables
    let (table, _) = res::build(["pelvis"], &[], &[], Vec::<&str>::new()).unwrap();
    let mut archive = Archive::new();
    archive.push("RES.bin", table.encode().unwrap()).unwrap();
    archive.push("res.bin", table.encode().unwrap()).unwrap();
    assert!(load_package(&archive, &LoadOptions::default()).unwrap_err().is_format_error());

    // A corrupt bone blob
    let mut archive = Archive::new();
    archive.push("000.mbn", vec![0; 10]).unwrap();
    assert!(load_package(&archive, &LoadOptions::default()).unwrap_err().is_format_error());

    // Splits without a clip
    let mut source = character_source();
    source.animation = None;
    assert!(build_archive(&source, &PackOptions::default()).is_err());

    // A split past the end of its clip
    let mut source = character_source();
    source.splits[0].frame_end = 260;
    assert!(build_archive(&source, &PackOptions::default()).is_err());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_archive(dir.path().join("missing.xc")).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_camera_entry_routes() {
    let mut camera = CameraClip::new(hash_name("cam_intro"), 60);
    camera.push_location(0, Vec3::new(0.0, 1.5, -5.0));
    camera.push_location(59, Vec3::new(2.0, 1.5, -4.0));
    camera.push_rotation(0, Quat::IDENTITY);

    let mut archive = Archive::new();
    archive.push("000.cmr2", camera.encode().unwrap()).unwrap();
    let package = load_package(&archive, &LoadOptions::default()).unwrap();
    assert_eq!(package.cameras.len(), 1);
    assert!(package.cameras[0].location_at(59).abs_diff_eq(Vec3::new(2.0, 1.5, -4.0), 1e-6));
    // No RES.bin means an empty table, not an error
    assert!(package.resources.bones().is_empty());
}

#[test]
fn test_empty_bone_names_rejected() {
    let mut source = character_source();
    source.bones.push(BoneSource::new("tail", Some(""), Transform::IDENTITY));
    assert!(build_archive(&source, &PackOptions::default()).unwrap_err().is_format_error());

    let mut source = character_source();
    source.bones.push(BoneSource::new("", Some("pelvis"), Transform::IDENTITY));
    assert!(build_archive(&source, &PackOptions::default()).unwrap_err().is_format_error());
}
