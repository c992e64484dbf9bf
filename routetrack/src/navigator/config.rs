//! Navigator configuration.

/// Default buffer lattice resolution in degrees.
pub const DEFAULT_BUFFER_GRID_SIZE: f32 = 0.0025;

/// Default buffer width in lattice cells.
pub const DEFAULT_BUFFER_DILATION: u16 = 1;

/// Parameters of the buffered route geometry query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferConfig {
    /// Lattice cell size in degrees. Larger cells give a coarser, simpler
    /// polygon.
    pub grid_size: f32,
    /// Buffer width around the route, in cells.
    pub dilation: u16,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_BUFFER_GRID_SIZE,
            dilation: DEFAULT_BUFFER_DILATION,
        }
    }
}

/// Configuration for a [`super::Navigator`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NavigatorConfig {
    pub buffer: BufferConfig,
}

impl NavigatorConfig {
    pub fn with_buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = buffer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_defaults() {
        let config = NavigatorConfig::default();
        assert_eq!(config.buffer.grid_size, 0.0025);
        assert_eq!(config.buffer.dilation, 1);
    }

    #[test]
    fn test_with_buffer() {
        let config = NavigatorConfig::default().with_buffer(BufferConfig {
            grid_size: 0.01,
            dilation: 3,
        });
        assert_eq!(config.buffer.dilation, 3);
    }
}
