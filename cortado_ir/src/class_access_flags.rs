use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Class modifier flags as reported by the lifter.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
    pub struct ClassAccessFlags: u16 {
        /// Declared public; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared final; no subclasses allowed.
        const FINAL = 0x0010;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared abstract; must not be instantiated.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an enum class.
        const ENUM = 0x4000;
    }
}

impl Default for ClassAccessFlags {
    fn default() -> ClassAccessFlags {
        ClassAccessFlags::empty()
    }
}

impl fmt::Display for ClassAccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut access_flags = Vec::new();
        if self.contains(ClassAccessFlags::PUBLIC) {
            access_flags.push("public");
        }
        if self.contains(ClassAccessFlags::FINAL) {
            access_flags.push("final");
        }
        if self.contains(ClassAccessFlags::ABSTRACT) {
            access_flags.push("abstract");
        }
        if self.contains(ClassAccessFlags::INTERFACE) {
            access_flags.push("interface");
        }
        write!(f, "{}", access_flags.join(" "))
    }
}
