//! Camera resolution indices understood by TimerCam firmware.

/// Index, width and height of every frame size the firmware knows.
pub const TABLE: [(u8, u16, u16); 15] = [
    (0, 96, 96),
    (1, 160, 120),
    (2, 176, 144),
    (3, 240, 176),
    (4, 240, 240),
    (5, 320, 240),
    (6, 400, 296),
    (7, 480, 320),
    (8, 640, 480),
    (9, 800, 600),
    (10, 1024, 768),
    (11, 1280, 720),
    (12, 1280, 1024),
    (13, 1600, 1200),
    (14, 1920, 1080),
];

/// Indices accepted by the basic and Aliyun modes.
pub const BASIC: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];

/// Indices accepted by the SMB and S3 upload modes.
pub const SMB_S3: &[u8] = &[8, 11, 14];

/// `(width, height)` for a resolution index.
pub fn dimensions(index: u8) -> Option<(u16, u16)> {
    TABLE
        .iter()
        .find(|(i, _, _)| *i == index)
        .map(|&(_, w, h)| (w, h))
}

/// One `index: WxH` line per allowed index.
pub fn describe(allowed: &[u8]) -> String {
    allowed
        .iter()
        .filter_map(|&i| dimensions(i).map(|(w, h)| format!("{i}: {w}x{h}")))
        .collect::<Vec<_>>()
        .join("\n")
}
