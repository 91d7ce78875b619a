use hashbrown::HashSet;

/// Keyboard key, values follow the USB HID usage ids (SDL scancodes)
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum KeyCode {
    Invalid = 0,
    KeyA = 4,
    KeyB = 5,
    KeyC = 6,
    KeyD = 7,
    KeyE = 8,
    KeyF = 9,
    KeyG = 10,
    KeyH = 11,
    KeyI = 12,
    KeyJ = 13,
    KeyK = 14,
    KeyL = 15,
    KeyM = 16,
    KeyN = 17,
    KeyO = 18,
    KeyP = 19,
    KeyQ = 20,
    KeyR = 21,
    KeyS = 22,
    KeyT = 23,
    KeyU = 24,
    KeyV = 25,
    KeyW = 26,
    KeyX = 27,
    KeyY = 28,
    KeyZ = 29,
    Return = 40,
    Escape = 41,
    BackSpace = 42,
    Tab = 43,
    Space = 44,
    Pause = 72,
    Right = 79,
    Left = 80,
    Down = 81,
    Up = 82,
    LeftControl = 100,
    LeftShift = 101,
    LeftAlt = 102,
    RightControl = 104,
    RightShift = 105,
    RightAlt = 106,
}

impl From<u8> for KeyCode {
    fn from(value: u8) -> Self {
        use KeyCode::*;

        match value {
            4 => KeyA,
            5 => KeyB,
            6 => KeyC,
            7 => KeyD,
            8 => KeyE,
            9 => KeyF,
            10 => KeyG,
            11 => KeyH,
            12 => KeyI,
            13 => KeyJ,
            14 => KeyK,
            15 => KeyL,
            16 => KeyM,
            17 => KeyN,
            18 => KeyO,
            19 => KeyP,
            20 => KeyQ,
            21 => KeyR,
            22 => KeyS,
            23 => KeyT,
            24 => KeyU,
            25 => KeyV,
            26 => KeyW,
            27 => KeyX,
            28 => KeyY,
            29 => KeyZ,
            40 => Return,
            41 => Escape,
            42 => BackSpace,
            43 => Tab,
            44 => Space,
            72 => Pause,
            79 => Right,
            80 => Left,
            81 => Down,
            82 => Up,
            100 => LeftControl,
            101 => LeftShift,
            102 => LeftAlt,
            104 => RightControl,
            105 => RightShift,
            106 => RightAlt,
            _ => Invalid,
        }
    }
}

/// Keys currently held down
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
}

impl InputState {
    /// Record a key press or release
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if key == KeyCode::Invalid {
            log::debug!("Ignore invalid key code");
            return;
        }
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Any of the keys is held
    pub fn any_pressed(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|key| self.is_pressed(*key))
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}
