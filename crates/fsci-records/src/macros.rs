/// Declares a one-byte wire enum with `TryFrom<u8>`, `From<Self> for u8`
/// and a [`Marshal`](crate::Marshal) impl.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(value: u8) -> Result<Self, u8> {
                match value {
                    $( v if v == $value => Ok($name::$variant), )+
                    other => Err(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        impl $crate::marshal::Marshal for $name {
            fn wire_size(&self) -> usize {
                1
            }

            fn encode(&self, w: &mut fsci_frame::WireWriter) -> fsci_frame::WireResult<()> {
                w.put_u8(u8::from(*self))
            }

            fn decode(r: &mut fsci_frame::WireReader<'_>) -> fsci_frame::WireResult<Self> {
                Self::decode_field(r, stringify!($name))
            }

            fn decode_field(
                r: &mut fsci_frame::WireReader<'_>,
                field: &'static str,
            ) -> fsci_frame::WireResult<Self> {
                r.enum_u8(field)
            }
        }
    };
}

macro_rules! field_size {
    (; $v:expr) => {
        $crate::marshal::Marshal::wire_size(&$v)
    };
    (len_u8; $v:expr) => {
        1 + $v.len()
    };
    (len_u16; $v:expr) => {
        2 + $v.len()
    };
    (u24; $v:expr) => {
        3
    };
}

macro_rules! field_encode {
    ($w:ident, ; $f:expr, $v:expr) => {
        $crate::marshal::Marshal::encode(&$v, $w)?
    };
    ($w:ident, len_u8; $f:expr, $v:expr) => {
        $w.put_bytes_u8($f, &$v)?
    };
    ($w:ident, len_u16; $f:expr, $v:expr) => {
        $w.put_bytes_u16($f, &$v)?
    };
    ($w:ident, u24; $f:expr, $v:expr) => {
        $w.put_u24($f, $v)?
    };
}

macro_rules! field_decode {
    ($r:ident, ; $f:expr, $ty:ty) => {
        <$ty as $crate::marshal::Marshal>::decode_field($r, $f)?
    };
    ($r:ident, len_u8; $f:expr, $ty:ty) => {
        $r.bytes_u8($f)?
    };
    ($r:ident, len_u16; $f:expr, $ty:ty) => {
        $r.bytes_u16($f)?
    };
    ($r:ident, u24; $f:expr, $ty:ty) => {
        $r.u24($f)?
    };
}

/// Declares a record whose wire layout is its fields in order.
///
/// A field's layout defaults to its own [`Marshal`](crate::Marshal) impl.
/// `=> len_u8` / `=> len_u16` mark a `Vec<u8>` carried with a length
/// prefix, `=> u24` a `u32` carried in three bytes.
macro_rules! record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                pub $field:ident : $ty:ty $(=> $layout:ident)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::marshal::Marshal for $name {
            fn wire_size(&self) -> usize {
                0 $( + field_size!($($layout)?; self.$field) )*
            }

            fn encode(&self, w: &mut fsci_frame::WireWriter) -> fsci_frame::WireResult<()> {
                let _ = &w;
                $( field_encode!(w, $($layout)?; stringify!($field), self.$field); )*
                Ok(())
            }

            fn decode(r: &mut fsci_frame::WireReader<'_>) -> fsci_frame::WireResult<Self> {
                let _ = &r;
                Ok(Self {
                    $( $field: field_decode!(r, $($layout)?; stringify!($field), $ty), )*
                })
            }
        }
    };
}
