//! Write-then-read fidelity tests.

use std::path::PathBuf;

use crate::format::{
    AnnotationDocument, ImageSize, read_document, read_file, write_document, write_file,
};
use crate::model::{Annotation, BoundingBox, Color};

fn document(annotations: &[(&str, (i32, i32, i32, i32))], colors: &[(&str, &str)]) -> AnnotationDocument {
    let mut doc = AnnotationDocument::for_path(
        &PathBuf::from("/data/images/pets.jpg"),
        ImageSize::new(320, 240),
    );
    doc.annotations = annotations
        .iter()
        .map(|(label, bbox)| Annotation::new(*label, BoundingBox::from(*bbox)))
        .collect();
    doc.label_colors = colors
        .iter()
        .map(|(label, hex)| (label.to_string(), hex.parse::<Color>().unwrap()))
        .collect();
    doc
}

#[test]
fn test_cat_and_dog_roundtrip() {
    let original = document(
        &[("cat", (10, 10, 50, 60)), ("dog", (5, 5, 20, 20))],
        &[("cat", "#ff0000"), ("dog", "#00ff00")],
    );

    let xml = write_document(&original).unwrap();
    let restored = read_document(&xml).unwrap();

    assert_eq!(restored.labels(), vec!["cat", "dog"]);
    assert_eq!(restored.bounding_boxes(), vec![(10, 10, 50, 60), (5, 5, 20, 20)]);
    assert_eq!(restored.color("cat").map(|c| c.to_hex()), Some("#ff0000".into()));
    assert_eq!(restored.color("dog").map(|c| c.to_hex()), Some("#00ff00".into()));
    assert_eq!(restored, original);
}

#[test]
fn test_single_annotation_roundtrip() {
    let original = document(&[("cat", (0, 0, 1, 1))], &[("cat", "#123456")]);
    let restored = read_document(&write_document(&original).unwrap()).unwrap();
    assert_eq!(restored.annotations.len(), 1);
    assert_eq!(restored, original);
}

#[test]
fn test_empty_roundtrip() {
    let original = document(&[], &[]);
    let restored = read_document(&write_document(&original).unwrap()).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn test_repeated_label_roundtrip() {
    let original = document(
        &[
            ("car", (1, 1, 9, 9)),
            ("person", (2, 2, 8, 8)),
            ("car", (3, 3, 7, 7)),
        ],
        &[("car", "#0000ff"), ("person", "#ffff00")],
    );
    let restored = read_document(&write_document(&original).unwrap()).unwrap();
    assert_eq!(restored.labels(), vec!["car", "person", "car"]);
    assert_eq!(restored.label_colors.len(), 2);
    assert_eq!(restored, original);
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations").join("pets.xml");
    let original = document(&[("cat", (10, 10, 50, 60))], &[("cat", "#ff0000")]);

    write_file(&original, &path).unwrap();
    assert!(path.exists());
    assert_eq!(read_file(&path).unwrap(), original);
}

#[test]
fn test_write_file_replaces_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pets.xml");

    let first = document(&[("cat", (10, 10, 50, 60))], &[("cat", "#ff0000")]);
    let second = document(&[], &[]);
    write_file(&first, &path).unwrap();
    write_file(&second, &path).unwrap();

    assert!(read_file(&path).unwrap().annotations.is_empty());
}
