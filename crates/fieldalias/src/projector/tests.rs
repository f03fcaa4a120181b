// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for field projection.

#![allow(dead_code)] // Layout-only fixtures are never read directly

use super::*;
use crate::identity::TypeIdentity;
use crate::types::TypeRegistry;
use crate::Reflect;
use std::ptr;
use std::sync::Arc;

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Reflect)]
struct Sample {
    flag: bool,
    small: u8,
    wide: u64,
    ratio: f64,
    label: String,
    origin: Point,
}

#[derive(Reflect)]
struct Link {
    value: u32,
    next: *mut Link,
}

#[derive(Reflect)]
struct Counter {
    i: i64,
}

fn sample() -> Sample {
    Sample {
        flag: true,
        small: 0xAB,
        wide: u64::MAX - 3,
        ratio: -1.25,
        label: "row".to_string(),
        origin: Point { x: -4, y: 9 },
    }
}

#[test]
fn test_project_value_reads_every_field() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Sample>().unwrap();
    let row = sample();
    let erased = Erased::of(&row);

    assert_eq!(desc.project_value(&erased, 0).unwrap().get::<bool>(), Some(true));
    assert_eq!(desc.project_value(&erased, 1).unwrap().get::<u8>(), Some(0xAB));
    assert_eq!(
        desc.project_value(&erased, 2).unwrap().get::<u64>(),
        Some(u64::MAX - 3)
    );
    assert_eq!(desc.project_value(&erased, 3).unwrap().get::<f64>(), Some(-1.25));
    assert_eq!(
        desc.project_value(&erased, 4)
            .unwrap()
            .downcast_ref::<String>()
            .map(String::as_str),
        Some("row")
    );
    assert_eq!(
        desc.project_value(&erased, 5).unwrap().get::<Point>(),
        Some(Point { x: -4, y: 9 })
    );
}

#[test]
fn test_projection_aliases_aggregate() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Sample>().unwrap();
    let row = sample();
    let erased = Erased::of(&row);

    let label = desc.project_value(&erased, 4).unwrap();
    assert_eq!(label.as_ptr(), ptr::from_ref(&row.label).cast::<u8>());

    let origin = desc.project_value(&erased, 5).unwrap();
    let point = registry.type_of::<Point>().unwrap();
    let y = point.project_value(&origin, 1).unwrap();
    assert_eq!(y.as_ptr(), ptr::from_ref(&row.origin.y).cast::<u8>());
}

#[test]
fn test_write_through_address_projection() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Counter>().unwrap();
    let mut counter = Counter { i: 123 };

    let address = desc
        .project_address(&Erased::address_of(&mut counter), 0)
        .unwrap();
    assert_eq!(address.identity(), TypeIdentity::of::<*mut i64>());
    let field = address.downcast_ptr::<i64>().unwrap();
    unsafe { *field = 456 };
    assert_eq!(counter.i, 456);

    counter.i = 789;
    let reread = desc.project_value(&Erased::of(&counter), 0).unwrap();
    assert_eq!(reread.get::<i64>(), Some(789));
}

#[test]
fn test_write_through_mutable_value_projection() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Counter>().unwrap();
    let mut counter = Counter { i: 1 };

    {
        let erased = Erased::of_mut(&mut counter);
        let field = desc.project_value(&erased, 0).unwrap();
        assert!(field.is_mutable());
        let slot = unsafe { field.downcast_mut::<i64>() }.unwrap();
        *slot = 2;
    }
    assert_eq!(counter.i, 2);

    let shared = desc.project_value(&Erased::of(&counter), 0).unwrap();
    assert!(!shared.is_mutable());
    assert!(unsafe { shared.downcast_mut::<i64>() }.is_none());
}

#[test]
fn test_by_value_and_by_address_agree() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Point>().unwrap();
    let mut point = Point { x: 3, y: 5 };

    let by_value = desc.project_value(&Erased::of(&point), 1).unwrap().as_ptr();
    let by_address = desc
        .project_value(&Erased::address_of(&mut point), 1)
        .unwrap()
        .as_ptr();
    assert_eq!(by_value, by_address);
}

#[test]
fn test_type_mismatch_reports_call_site() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Point>().unwrap();
    let other = 7_u32;

    let (err, line) = (desc.project_value(&Erased::of(&other), 0).unwrap_err(), line!());
    match err {
        Error::TypeMismatch {
            expected,
            found,
            location,
        } => {
            assert_eq!(expected, std::any::type_name::<Point>());
            assert_eq!(found, "u32");
            assert_eq!(location.file(), file!());
            assert_eq!(location.line(), line);
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn test_out_of_range_index() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Point>().unwrap();
    let point = Point { x: 0, y: 0 };

    let err = desc.project_value(&Erased::of(&point), 2).unwrap_err();
    assert_eq!(
        err,
        Error::OutOfRange {
            type_name: std::any::type_name::<Point>().to_string(),
            index: 2,
            len: 2,
        }
    );
    assert!(!err.is_fatal());
    assert!(desc.project_address(&Erased::of(&point), 2).is_err());
}

#[test]
fn test_opaque_has_no_fields() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<u32>().unwrap();
    let err = desc.project_value(&Erased::of(&5_u32), 0).unwrap_err();
    assert!(matches!(err, Error::UnsupportedKind { kind: Kind::Opaque, .. }));
    assert!(desc.len_of(&Erased::of(&5_u32)).is_err());
}

#[test]
fn test_raw_pointer_field_is_loaded() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Link>().unwrap();
    let mut tail = Link {
        value: 2,
        next: ptr::null_mut(),
    };
    let head = Link {
        value: 1,
        next: ptr::from_mut(&mut tail),
    };

    let next = desc.project_value(&Erased::of(&head), 1).unwrap();
    assert_eq!(next.identity(), desc.pointer_identity());
    assert_eq!(next.get::<*mut Link>(), Some(head.next));
    assert!(!next.is_trusted());

    // A loaded pointer is only followed on request.
    assert!(matches!(
        desc.project_value(&next, 0),
        Err(Error::UntrustedPointer { .. })
    ));
    let value = unsafe { desc.project_value_unchecked(&next, 0) }.unwrap();
    assert_eq!(value.get::<u32>(), Some(2));

    let end = unsafe { desc.project_value_unchecked(&next, 1) }.unwrap();
    assert_eq!(end.get::<*mut Link>(), Some(ptr::null_mut()));
    assert!(matches!(
        desc.project_value(&end, 0),
        Err(Error::NullPointer { .. })
    ));
}

#[test]
fn test_project_through_pointer_descriptor() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<*mut Point>().unwrap();
    assert_eq!(desc.kind(), Kind::Pointer);

    let mut point = Point { x: 11, y: 12 };
    let raw_point = ptr::from_mut(&mut point);
    let vouched = unsafe { Erased::from_ptr(raw_point) };
    let target = desc.project_value(&vouched, 0).unwrap();
    assert!(target.is::<Point>());
    assert_eq!(target.get::<Point>(), Some(Point { x: 11, y: 12 }));

    let null: *mut Point = ptr::null_mut();
    let err = desc.project_value(&Erased::of(&null), 0).unwrap_err();
    assert!(matches!(err, Error::NullPointer { .. }));
    assert!(desc.project_value(&vouched, 1).is_err());
}

#[test]
fn test_safe_projection_refuses_dangling_pointers() {
    let registry = TypeRegistry::new();
    let dangling = ptr::NonNull::<u64>::dangling().as_ptr();

    let desc = registry.type_of::<*mut u64>().unwrap();
    let err = desc.project_value(&Erased::of(&dangling), 0).unwrap_err();
    assert!(matches!(err, Error::UntrustedPointer { .. }));
    assert!(!err.is_fatal());
    assert!(desc.project_address(&Erased::of(&dangling), 0).is_err());
    assert!(desc.len_of(&Erased::of(&dangling)).is_err());

    // Raw pointer by value against the pointee descriptor.
    let point = registry.type_of::<Point>().unwrap();
    let stray = ptr::NonNull::<Point>::dangling().as_ptr();
    assert!(matches!(
        point.project_value(&Erased::of(&stray), 0),
        Err(Error::UntrustedPointer { .. })
    ));

    // NonNull reads its own slot but not the target.
    let non_null = ptr::NonNull::<Point>::dangling();
    let desc = registry.type_of::<ptr::NonNull<Point>>().unwrap();
    assert!(matches!(
        desc.project_value(&Erased::of(&non_null), 0),
        Err(Error::UntrustedPointer { .. })
    ));

    // A raw-pointer field holding garbage.
    let head = Link {
        value: 1,
        next: ptr::NonNull::<Link>::dangling().as_ptr(),
    };
    let link = registry.type_of::<Link>().unwrap();
    let next = link.project_value(&Erased::of(&head), 1).unwrap();
    assert!(link.project_value(&next, 0).is_err());
    assert!(link.project_address(&next, 1).is_err());
}

#[test]
fn test_live_non_null_projects_unchecked() {
    let registry = TypeRegistry::new();
    let mut point = Point { x: 5, y: 6 };
    let non_null = ptr::NonNull::from(&mut point);
    let desc = registry.type_of::<ptr::NonNull<Point>>().unwrap();

    let target = unsafe { desc.project_value_unchecked(&Erased::of(&non_null), 0) }.unwrap();
    assert_eq!(target.get::<Point>(), Some(Point { x: 5, y: 6 }));
    let address = unsafe { desc.project_address_unchecked(&Erased::of(&non_null), 0) }.unwrap();
    assert_eq!(address.downcast_ptr::<Point>(), Some(non_null.as_ptr()));
}

#[test]
fn test_smart_pointers_dereference() {
    let registry = TypeRegistry::new();

    let boxed = Box::new(Point { x: 1, y: 2 });
    let desc = registry.type_of::<Box<Point>>().unwrap();
    let target = desc.project_value(&Erased::of(&boxed), 0).unwrap();
    assert_eq!(target.as_ptr(), ptr::from_ref(&*boxed).cast::<u8>());
    assert_eq!(target.get::<Point>(), Some(Point { x: 1, y: 2 }));

    let shared = Arc::new(Counter { i: 42 });
    let desc = registry.type_of::<Arc<Counter>>().unwrap();
    let target = desc.project_value(&Erased::of(&shared), 0).unwrap();
    let counter = registry.type_of::<Counter>().unwrap();
    let i = counter.project_value(&target, 0).unwrap();
    assert_eq!(i.get::<i64>(), Some(42));

    let address = desc.project_address(&Erased::of(&shared), 0).unwrap();
    assert_eq!(address.downcast_ptr::<Counter>(), Some(Arc::as_ptr(&shared).cast_mut()));
}

#[test]
fn test_array_elements_follow_stride() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<[u32; 4]>().unwrap();
    let values = [10_u32, 20, 30, 40];
    let erased = Erased::of(&values);

    assert_eq!(desc.len_of(&erased).unwrap(), 4);
    for (index, expected) in values.iter().enumerate() {
        let element = desc.project_value(&erased, index).unwrap();
        assert_eq!(element.get::<u32>(), Some(*expected));
        assert_eq!(element.as_ptr(), ptr::from_ref(expected).cast::<u8>());
    }
    assert!(desc.project_value(&erased, 4).is_err());
}

#[test]
fn test_slice_length_is_read_live() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Vec<u16>>().unwrap();
    let mut values: Vec<u16> = (0..3).collect();

    assert_eq!(desc.len_of(&Erased::of(&values)).unwrap(), 3);
    assert!(desc.project_value(&Erased::of(&values), 3).is_err());

    values.push(3);
    let erased = Erased::of(&values);
    assert_eq!(desc.len_of(&erased).unwrap(), 4);
    let last = desc.project_value(&erased, 3).unwrap();
    assert_eq!(last.get::<u16>(), Some(3));
    assert_eq!(last.as_ptr(), ptr::from_ref(&values[3]).cast::<u8>());
    assert_eq!(desc.field_offset(3).unwrap(), 6);
}

#[test]
fn test_slice_offset_overflow_is_out_of_range() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Vec<u64>>().unwrap();

    let err = desc.field_offset(usize::MAX).unwrap_err();
    assert_eq!(
        err,
        Error::OutOfRange {
            type_name: std::any::type_name::<Vec<u64>>().to_string(),
            index: usize::MAX,
            len: usize::MAX / 8,
        }
    );
    assert_eq!(desc.field_offset(usize::MAX / 8).unwrap(), usize::MAX / 8 * 8);
}

#[test]
fn test_empty_slice_rejects_every_index() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<Vec<String>>().unwrap();
    let values: Vec<String> = Vec::new();
    let erased = Erased::of(&values);

    assert_eq!(desc.len_of(&erased).unwrap(), 0);
    assert_eq!(
        desc.project_value(&erased, 0).unwrap_err(),
        Error::OutOfRange {
            type_name: std::any::type_name::<Vec<String>>().to_string(),
            index: 0,
            len: 0,
        }
    );
}

#[test]
fn test_tuple_fields_project() {
    let registry = TypeRegistry::new();
    let desc = registry.type_of::<(u8, String, i64)>().unwrap();
    let tuple = (9_u8, "mid".to_string(), -77_i64);
    let erased = Erased::of(&tuple);

    assert_eq!(desc.fields().unwrap()[2].name(), "2");
    assert_eq!(desc.project_value(&erased, 0).unwrap().get::<u8>(), Some(9));
    assert_eq!(desc.project_value(&erased, 2).unwrap().get::<i64>(), Some(-77));
}
