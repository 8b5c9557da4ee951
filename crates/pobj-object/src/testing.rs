//! Shared fixtures for unit tests: a few declared types and a small space.

use std::sync::{Arc, LazyLock};

use pobj_region::{HeapConfig, VolatileRegion};
use pobj_types::{Field, ObjectField, ObjectType, ValueField};

use crate::array::PersistentImmutableByteArray;
use crate::config::SpaceConfig;
use crate::error::ObjectResult;
use crate::object::PersistentObject;
use crate::pointer::ObjectPointer;
use crate::space::ObjectSpace;
use crate::traits::{Persistent, Reconstruct};

pub struct PointLayout {
    pub ty: Arc<ObjectType>,
    pub x: Field<i32>,
    pub y: Field<i32>,
}

pub static POINT: LazyLock<PointLayout> = LazyLock::new(|| {
    let mut b = ObjectType::builder("test.Point");
    let x = b.field();
    let y = b.field();
    PointLayout {
        ty: b.build(),
        x,
        y,
    }
});

pub struct WideLayout {
    pub ty: Arc<ObjectType>,
    pub a: Field<i32>,
    pub b: Field<i32>,
    pub c: Field<i32>,
}

pub static WIDE: LazyLock<WideLayout> = LazyLock::new(|| {
    let mut b = ObjectType::builder("test.Wide");
    let a = b.field();
    let bb = b.field();
    let c = b.field();
    WideLayout {
        ty: b.build(),
        a,
        b: bb,
        c,
    }
});

/// One field of every kind.
pub struct RecordLayout {
    pub ty: Arc<ObjectType>,
    pub byte: Field<i8>,
    pub short: Field<i16>,
    pub int: Field<i32>,
    pub long: Field<i64>,
    pub float: Field<f32>,
    pub double: Field<f64>,
    pub char: Field<char>,
    pub boolean: Field<bool>,
    pub next: ObjectField<Record>,
    pub origin: ValueField<Point>,
    /// Declared when `Wide` was still Point-sized.
    pub legacy: ValueField<Wide>,
    pub blob: ObjectField<PersistentImmutableByteArray>,
}

pub static RECORD: LazyLock<RecordLayout> = LazyLock::new(|| {
    let mut b = ObjectType::builder("test.Record");
    let byte = b.field();
    let short = b.field();
    let int = b.field();
    let long = b.field();
    let float = b.field();
    let double = b.field();
    let char = b.field();
    let boolean = b.field();
    let next = b.object_field();
    let origin = b.value_field(&POINT.ty);
    let legacy = b.value_field(&POINT.ty);
    let blob = b.object_field();
    RecordLayout {
        ty: b.build(),
        byte,
        short,
        int,
        long,
        float,
        double,
        char,
        boolean,
        next,
        origin,
        legacy,
        blob,
    }
});

macro_rules! wrapper {
    ($name:ident, $layout:ident) => {
        #[derive(Debug)]
        pub struct $name(PersistentObject);

        impl Persistent for $name {
            fn object(&self) -> &PersistentObject {
                &self.0
            }
        }

        impl Reconstruct for $name {
            fn object_type() -> Arc<ObjectType> {
                Arc::clone(&$layout.ty)
            }

            fn reconstruct(pointer: ObjectPointer) -> ObjectResult<Self> {
                Ok(Self(pointer.into_object()))
            }
        }
    };
}

wrapper!(Point, POINT);
wrapper!(Wide, WIDE);
wrapper!(Record, RECORD);

impl Point {
    /// A point over its own volatile storage, outside any cache.
    pub fn detached(space: &Arc<ObjectSpace>) -> Self {
        let region = Arc::new(VolatileRegion::new(POINT.ty.size()));
        Self(ObjectPointer::new(Arc::clone(space), Arc::clone(&POINT.ty), region).into_object())
    }
}

/// A space over a 64 KiB heap with the test types registered.
pub fn space() -> Arc<ObjectSpace> {
    space_with(SpaceConfig {
        heap: HeapConfig {
            capacity: 64 * 1024,
            ..HeapConfig::default()
        },
        ..SpaceConfig::default()
    })
}

pub fn space_with(config: SpaceConfig) -> Arc<ObjectSpace> {
    let space = ObjectSpace::open_in_memory(config);
    space.register::<Point>();
    space.register::<Wide>();
    space.register::<Record>();
    space
}
