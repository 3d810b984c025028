//! Synthetic ASD file images for integration tests.

#![allow(dead_code)]

pub const RAW: u8 = 0;
pub const REF: u8 = 1;
pub const RAD: u8 = 2;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a complete file image section by section.
pub struct AsdFileBuilder {
    header: Vec<u8>,
    raw: Vec<f64>,
    reference: Vec<f64>,
    reference_description: String,
    classifier_title: String,
    constituents: Vec<(String, String)>,
    dependant_labels: String,
    calibration: Vec<(i8, String, Vec<f64>)>,
    trailer: Vec<u8>,
}

impl AsdFileBuilder {
    /// Header with 350 nm start, 1 nm step, unity gains and no splices.
    pub fn new(channels: u16, data_type: u8) -> Self {
        let mut header = vec![0u8; 484];
        header[0..3].copy_from_slice(b"as7");
        header[186] = data_type;
        header[199] = 2;
        header[204..206].copy_from_slice(&channels.to_le_bytes());
        let mut b = Self {
            header,
            raw: vec![0.0; channels.into()],
            reference: vec![1.0; channels.into()],
            reference_description: String::new(),
            classifier_title: String::new(),
            constituents: Vec::new(),
            dependant_labels: String::new(),
            calibration: Vec::new(),
            trailer: Vec::new(),
        };
        b = b.wavelengths(350.0, 1.0).integration_time(1).gains(2048, 2048);
        b.put(444, &(channels as f32).to_le_bytes());
        b.put(448, &(channels as f32).to_le_bytes());
        b
    }

    fn put(&mut self, at: usize, bytes: &[u8]) {
        self.header[at..at + bytes.len()].copy_from_slice(bytes);
    }

    pub fn header_byte(mut self, at: usize, value: u8) -> Self {
        self.header[at] = value;
        self
    }

    pub fn wavelengths(mut self, start: f32, step: f32) -> Self {
        self.put(191, &start.to_le_bytes());
        self.put(195, &step.to_le_bytes());
        self
    }

    pub fn integration_time(mut self, ms: u32) -> Self {
        self.put(390, &ms.to_le_bytes());
        self
    }

    pub fn gains(mut self, swir1: u16, swir2: u16) -> Self {
        self.put(436, &swir1.to_le_bytes());
        self.put(438, &swir2.to_le_bytes());
        self
    }

    pub fn splices(mut self, splice1: f32, splice2: f32) -> Self {
        self.put(444, &splice1.to_le_bytes());
        self.put(448, &splice2.to_le_bytes());
        self
    }

    pub fn raw(mut self, values: &[f64]) -> Self {
        self.raw = values.to_vec();
        self
    }

    pub fn reference(mut self, values: &[f64]) -> Self {
        self.reference = values.to_vec();
        self
    }

    pub fn reference_description(mut self, text: &str) -> Self {
        self.reference_description = text.to_string();
        self
    }

    pub fn classifier_title(mut self, text: &str) -> Self {
        self.classifier_title = text.to_string();
        self
    }

    pub fn constituent(mut self, name: &str, pass_fail: &str) -> Self {
        self.constituents.push((name.to_string(), pass_fail.to_string()));
        self
    }

    pub fn dependant_labels(mut self, text: &str) -> Self {
        self.dependant_labels = text.to_string();
        self
    }

    pub fn calibration(mut self, tag: i8, name: &str, values: &[f64]) -> Self {
        self.calibration.push((tag, name.to_string(), values.to_vec()));
        self
    }

    pub fn trailer(mut self, bytes: &[u8]) -> Self {
        self.trailer = bytes.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.header.clone();
        doubles(&mut out, &self.raw);

        out.extend(1i16.to_le_bytes());
        out.extend(100i64.to_le_bytes());
        out.extend(200i64.to_le_bytes());
        bstr(&mut out, &self.reference_description);
        doubles(&mut out, &self.reference);

        out.extend([0u8, 0]);
        bstr(&mut out, &self.classifier_title);
        for _ in 1..18 {
            bstr(&mut out, "");
        }
        out.extend((self.constituents.len() as i16).to_le_bytes());
        for (i, (name, pass_fail)) in self.constituents.iter().enumerate() {
            bstr(&mut out, name);
            bstr(&mut out, pass_fail);
            doubles(&mut out, &[i as f64; 8]);
            out.extend((i as i32).to_le_bytes());
            doubles(&mut out, &[0.0, 0.0]);
        }

        out.push(0);
        out.extend(0i16.to_le_bytes());
        bstr(&mut out, &self.dependant_labels);
        out.extend(0f32.to_le_bytes());

        out.push(0);
        out.push(self.calibration.len() as u8);
        for (tag, name, _) in &self.calibration {
            out.push(*tag as u8);
            let mut slot = [0u8; 20];
            slot[..name.len()].copy_from_slice(name.as_bytes());
            out.extend(slot);
            out.extend(100i32.to_le_bytes());
            out.extend(2048i16.to_le_bytes());
            out.extend(2048i16.to_le_bytes());
        }
        for (_, _, values) in &self.calibration {
            doubles(&mut out, values);
        }

        out.extend(&self.trailer);
        out
    }
}

fn bstr(out: &mut Vec<u8>, text: &str) {
    out.extend((text.len() as i16).to_le_bytes());
    out.extend(text.as_bytes());
}

fn doubles(out: &mut Vec<u8>, values: &[f64]) {
    for v in values {
        out.extend(v.to_le_bytes());
    }
}

pub fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < 1e-9, "index {i}: {a} != {e}");
    }
}
