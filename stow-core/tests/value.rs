#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use stow_core::{AsValue, Value};
    use time::macros::{date, datetime, time};
    use uuid::Uuid;

    #[test]
    fn value_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert!(Value::Null.is_null());
        assert!(Value::Varchar(None).is_null());
        assert!(Value::Decimal(None, 10, 2).is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
        assert_eq!(Value::Int32(Some(5)).as_null(), Value::Int32(None));
        assert_eq!(
            Value::Decimal(Some(Decimal::ONE), 10, 2).as_null(),
            Value::Decimal(None, 10, 2)
        );
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(None));
        assert!(bool::try_from_value(val).unwrap());
        assert!(bool::try_from_value(1_i8.into()).unwrap());
        assert!(!bool::try_from_value(0_u64.into()).unwrap());
        assert!(bool::try_from_value(2_i32.into()).is_err());
        assert!(bool::try_from_value(0.5_f32.into()).is_err());
    }

    #[test]
    fn value_integers() {
        assert_eq!(127_i8.as_value(), Value::Int8(Some(127)));
        assert_eq!(i8::try_from_value(99_u8.into()).unwrap(), 99);
        assert!(i8::try_from_value(300_i32.into()).is_err());
        assert!(i8::try_from_value(0.1_f64.into()).is_err());
        assert_eq!(i32::try_from_value(Value::Int64(Some(-5))).unwrap(), -5);
        assert_eq!(i64::try_from_value(Value::Int32(Some(7))).unwrap(), 7);
        assert_eq!(u16::try_from_value(Value::Int64(Some(65535))).unwrap(), 65535);
        assert!(u16::try_from_value(Value::Int64(Some(-1))).is_err());
        assert_eq!(
            u64::try_from_value(Value::Decimal(Some(Decimal::from(42)), 0, 0)).unwrap(),
            42
        );
        assert!(i32::try_from_value(Value::Varchar(Some("1".into()))).is_err());
        let error = i32::try_from_value(Value::Int32(None)).unwrap_err();
        assert!(format!("{error}").contains("i32"));
    }

    #[test]
    fn value_floats() {
        assert_eq!(1.5_f32.as_value(), Value::Float32(Some(1.5)));
        assert_eq!(f32::try_from_value(Value::Float64(Some(0.25))).unwrap(), 0.25);
        assert!(f32::try_from_value(Value::Float64(Some(0.1))).is_err());
        assert_eq!(f64::try_from_value(Value::Float32(Some(0.5))).unwrap(), 0.5);
        assert_eq!(f64::try_from_value(Value::Int16(Some(3))).unwrap(), 3.0);
    }

    #[test]
    fn value_decimal() {
        let d = Decimal::from_str("12.345").unwrap();
        assert_eq!(d.as_value(), Value::Decimal(Some(d), 0, 3));
        assert_eq!(Decimal::as_empty_value(), Value::Decimal(None, 0, 0));
        assert_eq!(
            Decimal::try_from_value(Value::Varchar(Some("12.345".into()))).unwrap(),
            d
        );
        assert_eq!(
            Decimal::try_from_value(Value::Int64(Some(7))).unwrap(),
            Decimal::from(7)
        );
        assert!(Decimal::try_from_value(Value::Varchar(Some("abc".into()))).is_err());
    }

    #[test]
    fn value_text() {
        assert_eq!(Value::from("hello"), Value::Varchar(Some("hello".into())));
        assert_eq!(
            String::try_from_value(Value::Char(Some('x'))).unwrap(),
            "x".to_string()
        );
        assert_eq!(char::try_from_value(Value::Varchar(Some("y".into()))).unwrap(), 'y');
        assert!(char::try_from_value(Value::Varchar(Some("yz".into()))).is_err());
        assert!(String::try_from_value(Value::Varchar(None)).is_err());
        assert_eq!(
            Vec::<u8>::try_from_value(Value::Blob(Some([1, 2, 3].into()))).unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn value_time() {
        let ts = datetime!(2025-03-14 15:09:26);
        assert_eq!(ts.as_value(), Value::Timestamp(Some(ts)));
        assert_eq!(
            time::Date::try_from_value(Value::Timestamp(Some(ts))).unwrap(),
            date!(2025-03-14)
        );
        assert_eq!(
            time::Time::try_from_value(Value::Timestamp(Some(ts))).unwrap(),
            time!(15:09:26)
        );
        assert_eq!(
            time::PrimitiveDateTime::try_from_value(Value::Date(Some(date!(2025-03-14))))
                .unwrap(),
            datetime!(2025-03-14 0:00)
        );
        assert_eq!(
            time::OffsetDateTime::try_from_value(Value::Timestamp(Some(ts))).unwrap(),
            ts.assume_utc()
        );
    }

    #[test]
    fn value_uuid() {
        let text = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let uuid = Uuid::parse_str(text).unwrap();
        assert_eq!(uuid.as_value(), Value::Uuid(Some(uuid)));
        assert_eq!(Uuid::try_from_value(Value::Varchar(Some(text.into()))).unwrap(), uuid);
        assert_eq!(
            Uuid::try_from_value(Value::Blob(Some(uuid.as_bytes().to_vec().into()))).unwrap(),
            uuid
        );
        assert!(Uuid::try_from_value(Value::Varchar(Some("nope".into()))).is_err());
    }

    #[test]
    fn value_option() {
        assert_eq!(Option::<i32>::None.as_value(), Value::Int32(None));
        assert_eq!(Some(3_i32).as_value(), Value::Int32(Some(3)));
        assert_eq!(Option::<String>::as_empty_value(), Value::Varchar(None));
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::try_from_value(Value::Varchar(None)).unwrap(), None);
        assert_eq!(
            Option::<i64>::try_from_value(Value::Int32(Some(9))).unwrap(),
            Some(9)
        );
        assert_eq!(Box::new(4_u8).as_value(), Value::UInt8(Some(4)));
    }

    #[test]
    fn value_serialize() {
        let values = [
            Value::Int32(Some(1)),
            Value::Varchar(None),
            Value::Null,
            Value::Boolean(Some(false)),
            Value::Decimal(Some(Decimal::from_str("1.50").unwrap()), 0, 2),
        ];
        let json = serde_json::to_value(values).unwrap();
        assert_eq!(
            json,
            serde_json::json!([1, null, null, false, "1.50"])
        );
    }
}
