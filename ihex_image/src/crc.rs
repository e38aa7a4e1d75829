/// Running CRC16 used by the SMB! image header.
///
/// Each step reads the value left by the previous one, so the order of the
/// shifts and XORs below must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16(u16);

impl Crc16 {
    pub const INITIAL: u16 = 0xFFFF;

    pub fn new() -> Self {
        Crc16(Self::INITIAL)
    }

    pub fn update(&mut self, value: u8) {
        self.0 = update(value, self.0);
    }

    pub fn update_slice(&mut self, values: &[u8]) {
        values.iter().for_each(|&v| self.update(v));
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<u8> for Crc16 {
    fn extend<T: IntoIterator<Item = u8>>(&mut self, iter: T) {
        iter.into_iter().for_each(|v| self.update(v));
    }
}

/// Folds one byte into `crc`.
pub fn update(value: u8, crc: u16) -> u16 {
    let mut crc = crc.swap_bytes();
    crc ^= value as u16;
    crc ^= (crc & 0xff) >> 4;
    crc ^= crc << 12;
    crc ^= (crc & 0xff) << 5;
    crc
}

/// CRC16 of `values`, starting from [`Crc16::INITIAL`].
pub fn checksum<I: IntoIterator<Item = u8>>(values: I) -> u16 {
    let mut crc = Crc16::new();
    crc.extend(values);
    crc.value()
}

#[cfg(test)]
mod test {
    use super::*;

    const IBM_3740: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_IBM_3740);

    #[test]
    fn check_value() {
        assert_eq!(checksum(*b"123456789"), 0x29B1);
    }

    #[test]
    fn single_steps() {
        assert_eq!(update(0x00, 0xFFFF), 0xE1F0);
        assert_eq!(update(0x41, 0x0000), 0x58E5);
    }

    #[test]
    fn empty_input_keeps_initial_value() {
        assert_eq!(checksum(std::iter::empty()), Crc16::INITIAL);
    }

    #[test]
    fn erased_flash_windows() {
        assert_eq!(checksum(std::iter::repeat(0xFF).take(512)), 0x6995);
        assert_eq!(checksum(std::iter::repeat(0xFF).take(8192)), 0xFFFC);
    }

    #[test]
    fn matches_ibm_3740() {
        let mut data = Vec::new();
        let mut seed: u32 = 0x1234_5678;
        for len in [1usize, 2, 15, 16, 255, 1024] {
            data.clear();
            for _ in 0..len {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                data.push((seed >> 16) as u8);
            }
            let mut crc = Crc16::new();
            crc.update_slice(&data);
            assert_eq!(crc.value(), IBM_3740.checksum(&data), "length {len}");
        }
    }
}
