//! Shared helpers for propper integration tests

/// Declare a struct that stores managed properties.
///
/// The schema registry is process-wide, so every test declares its own
/// types to keep registrations from leaking between tests.
macro_rules! managed_type {
    ($($name:ident),+ $(,)?) => {
        $(
            struct $name {
                slots: propper::Slots,
            }

            #[allow(dead_code)]
            impl $name {
                fn new() -> Self {
                    Self {
                        slots: propper::Slots::of::<Self>(),
                    }
                }
            }

            impl propper::Managed for $name {
                fn slots(&self) -> &propper::Slots {
                    &self.slots
                }

                fn slots_mut(&mut self) -> &mut propper::Slots {
                    &mut self.slots
                }
            }
        )+
    };
}

pub(crate) use managed_type;
