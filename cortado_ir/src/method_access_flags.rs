use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Method modifier flags as reported by the lifter.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
    pub struct MethodAccessFlags: u16 {
        /// Declared public; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared private; accessible only within the defining class.
        const PRIVATE = 0x0002;
        /// Declared protected; may be accessed within subclasses.
        const PROTECTED = 0x0004;
        /// Declared static.
        const STATIC = 0x0008;
        /// Declared final; must not be overridden.
        const FINAL = 0x0010;
        /// Declared synchronized; invocation is wrapped by a monitor use.
        const SYNCHRONIZED = 0x0020;
        /// A bridge method, generated by the compiler.
        const BRIDGE = 0x0040;
        /// Declared with variable number of arguments.
        const VARARGS = 0x0080;
        /// Declared native; implemented in a language other than Java.
        const NATIVE = 0x0100;
        /// Declared abstract; no implementation is provided.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
    }
}

impl Default for MethodAccessFlags {
    fn default() -> MethodAccessFlags {
        MethodAccessFlags::empty()
    }
}

impl fmt::Display for MethodAccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut access_flags = Vec::new();
        if self.contains(MethodAccessFlags::PUBLIC) {
            access_flags.push("public");
        }
        if self.contains(MethodAccessFlags::PRIVATE) {
            access_flags.push("private");
        }
        if self.contains(MethodAccessFlags::PROTECTED) {
            access_flags.push("protected");
        }
        if self.contains(MethodAccessFlags::STATIC) {
            access_flags.push("static");
        }
        if self.contains(MethodAccessFlags::FINAL) {
            access_flags.push("final");
        }
        if self.contains(MethodAccessFlags::NATIVE) {
            access_flags.push("native");
        }
        if self.contains(MethodAccessFlags::ABSTRACT) {
            access_flags.push("abstract");
        }
        write!(f, "{}", access_flags.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(MethodAccessFlags::empty(), MethodAccessFlags::default());
    }

    #[test]
    fn test_display() {
        let flags = MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC;
        assert_eq!("public static", flags.to_string());
    }
}
