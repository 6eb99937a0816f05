mod test_forward_descriptors;
