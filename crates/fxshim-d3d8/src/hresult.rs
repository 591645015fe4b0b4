//! Native result codes.
//!
//! The legacy and the next-generation API share the same `HRESULT` numbering, so a single
//! newtype covers both sides of the translation layer.

use std::fmt;

/// A native `HRESULT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

/// Result of a call into the native runtime.
pub type NativeResult<T> = Result<T, HResult>;

const fn make_d3d(code: u32) -> HResult {
    // MAKE_HRESULT(1, _FACILITY_D3D (0x876), code)
    HResult((0x8876_0000u32 | code) as i32)
}

impl HResult {
    pub const OK: HResult = HResult(0);
    pub const FALSE: HResult = HResult(1);
    pub const E_FAIL: HResult = HResult(0x8000_4005u32 as i32);
    pub const E_NOINTERFACE: HResult = HResult(0x8000_4002u32 as i32);
    pub const E_OUTOFMEMORY: HResult = HResult(0x8007_000Eu32 as i32);
    pub const WRONGTEXTUREFORMAT: HResult = make_d3d(2072);
    pub const UNSUPPORTEDCOLOROPERATION: HResult = make_d3d(2073);
    pub const TOOMANYOPERATIONS: HResult = make_d3d(2077);
    pub const CONFLICTINGTEXTUREFILTER: HResult = make_d3d(2078);
    pub const NOTFOUND: HResult = make_d3d(2150);
    pub const MOREDATA: HResult = make_d3d(2151);
    pub const DEVICELOST: HResult = make_d3d(2152);
    pub const DEVICENOTRESET: HResult = make_d3d(2153);
    pub const NOTAVAILABLE: HResult = make_d3d(2154);
    pub const OUTOFVIDEOMEMORY: HResult = make_d3d(380);
    pub const INVALIDDEVICE: HResult = make_d3d(2155);
    pub const INVALIDCALL: HResult = make_d3d(2156);
    pub const DRIVERINVALIDCALL: HResult = make_d3d(2157);

    pub fn is_ok(self) -> bool {
        self.0 >= 0
    }

    pub fn is_err(self) -> bool {
        self.0 < 0
    }

    pub fn ok(self) -> NativeResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Collapses a native result back into the code seen at the ABI boundary.
    pub fn from_result<T>(result: &NativeResult<T>) -> HResult {
        match result {
            Ok(_) => HResult::OK,
            Err(hr) => *hr,
        }
    }

    fn name(self) -> Option<&'static str> {
        let name = match self {
            HResult::OK => "D3D_OK",
            HResult::FALSE => "S_FALSE",
            HResult::E_FAIL => "E_FAIL",
            HResult::E_NOINTERFACE => "E_NOINTERFACE",
            HResult::E_OUTOFMEMORY => "E_OUTOFMEMORY",
            HResult::WRONGTEXTUREFORMAT => "D3DERR_WRONGTEXTUREFORMAT",
            HResult::UNSUPPORTEDCOLOROPERATION => "D3DERR_UNSUPPORTEDCOLOROPERATION",
            HResult::TOOMANYOPERATIONS => "D3DERR_TOOMANYOPERATIONS",
            HResult::CONFLICTINGTEXTUREFILTER => "D3DERR_CONFLICTINGTEXTUREFILTER",
            HResult::NOTFOUND => "D3DERR_NOTFOUND",
            HResult::MOREDATA => "D3DERR_MOREDATA",
            HResult::DEVICELOST => "D3DERR_DEVICELOST",
            HResult::DEVICENOTRESET => "D3DERR_DEVICENOTRESET",
            HResult::NOTAVAILABLE => "D3DERR_NOTAVAILABLE",
            HResult::OUTOFVIDEOMEMORY => "D3DERR_OUTOFVIDEOMEMORY",
            HResult::INVALIDDEVICE => "D3DERR_INVALIDDEVICE",
            HResult::INVALIDCALL => "D3DERR_INVALIDCALL",
            HResult::DRIVERINVALIDCALL => "D3DERR_DRIVERINVALIDCALL",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({:#010x})", self.0 as u32),
            None => write!(f, "HRESULT {:#010x}", self.0 as u32),
        }
    }
}

impl std::error::Error for HResult {}
