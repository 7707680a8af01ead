//! Testing utilities and fixtures

/// Test fixtures for common scenarios
pub mod fixtures {
    use crate::types::*;

    /// Integer values, with `None` standing in for SQL NULL
    pub fn ints(values: &[Option<i32>]) -> Vec<Value> {
        values
            .iter()
            .map(|v| v.map(Value::Ints).unwrap_or(Value::Null))
            .collect()
    }

    /// Float values, with `None` standing in for SQL NULL
    pub fn floats(values: &[Option<f32>]) -> Vec<Value> {
        values
            .iter()
            .map(|v| v.map(Value::Floats).unwrap_or(Value::Null))
            .collect()
    }

    /// `t(id INT NOT NULL, x INT NOT NULL)`
    pub fn id_x_meta() -> TableMeta {
        TableMeta::new(
            "t",
            vec![
                FieldMeta::new("id", AttrType::Ints, 4).not_null(),
                FieldMeta::new("x", AttrType::Ints, 4).not_null(),
            ],
        )
    }

    /// `users(id INT NOT NULL, name CHAR(8) NOT NULL, score FLOAT NULL, born DATE NULL)`
    pub fn users_meta() -> TableMeta {
        TableMeta::new(
            "users",
            vec![
                FieldMeta::new("id", AttrType::Ints, 4).not_null(),
                FieldMeta::new("name", AttrType::Chars, 8).not_null(),
                FieldMeta::new("score", AttrType::Floats, 4),
                FieldMeta::new("born", AttrType::Dates, 4),
            ],
        )
    }

    /// Sample user rows matching [`users_meta`]
    pub fn sample_users(count: usize) -> Vec<Vec<Value>> {
        (0..count)
            .map(|i| {
                vec![
                    Value::Ints(i as i32 + 1),
                    Value::Chars(format!("user_{}", i)),
                    if i % 3 == 0 {
                        Value::Null
                    } else {
                        Value::Floats(i as f32 * 1.5)
                    },
                    Value::Dates(20240101 + i as i32 % 28),
                ]
            })
            .collect()
    }
}
