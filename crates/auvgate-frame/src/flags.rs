//! Bit-packed boolean groups.
//!
//! A group is a struct of named flags. Its declaration order is the wire
//! order: flag `i` lives in bit `i`, least significant bit first. The same
//! [`FlagGroup::NAMES`] table drives packing, unpacking and the key check
//! on inbound control JSON, so encode and decode cannot drift apart.

/// A set of named booleans packed into one byte.
pub trait FlagGroup: Default + Copy {
    /// Flag names in bit order (index 0 = least significant bit).
    const NAMES: &'static [&'static str];

    fn get(&self, index: usize) -> bool;

    fn set(&mut self, index: usize, value: bool);

    /// Bit index of a named flag.
    fn index_of(name: &str) -> Option<usize> {
        Self::NAMES.iter().position(|candidate| *candidate == name)
    }

    /// Pack into a byte. Bits past the last flag are zero.
    fn to_byte(&self) -> u8 {
        (0..Self::NAMES.len())
            .filter(|&index| self.get(index))
            .fold(0u8, |byte, index| byte | (1 << index))
    }

    /// Unpack from a byte. Bits past the last flag are ignored.
    fn from_byte(byte: u8) -> Self {
        let mut group = Self::default();
        for index in 0..Self::NAMES.len() {
            group.set(index, byte & (1 << index) != 0);
        }
        group
    }

    fn any(&self) -> bool {
        (0..Self::NAMES.len()).any(|index| self.get(index))
    }
}

macro_rules! flag_group {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$field_meta:meta])* $field:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $( $(#[$field_meta])* pub $field: bool, )+
        }

        impl FlagGroup for $name {
            const NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            fn get(&self, index: usize) -> bool {
                [$(self.$field),+].get(index).copied().unwrap_or(false)
            }

            fn set(&mut self, index: usize, value: bool) {
                let mut slots = [$(&mut self.$field),+];
                if let Some(slot) = slots.get_mut(index) {
                    **slot = value;
                }
            }
        }
    };
}

flag_group! {
    /// Controller enable flags, requested (control frame) or active (telemetry).
    pub struct ControllerFlags {
        roll,
        pitch,
        depth,
        altitude,
        yaw,
        speed_x,
        speed_y,
    }
}

flag_group! {
    /// Payload actuators.
    pub struct PayloadFlags {
        magnet_1,
        magnet_2,
    }
}

flag_group! {
    /// Sensor faults reported by the vehicle.
    pub struct SensorErrors {
        pressure,
        imu,
    }
}
